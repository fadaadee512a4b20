use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Where per-user image arrays are read from and label tables written to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Flush interval: the table is written after an advance from any cell
    /// that is not a multiple of this value, and always on completion.
    #[serde(default = "default_backup_every")]
    pub backup_every: NonZeroUsize,
    /// Image channel shown on screen.
    #[serde(default)]
    pub display_channel: usize,
}

// Default value functions
fn default_input_dir() -> PathBuf {
    PathBuf::from("data/inputs")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/outputs")
}

fn default_backup_every() -> NonZeroUsize {
    NonZeroUsize::MIN.saturating_add(1)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backup_every: default_backup_every(),
            display_channel: 0,
        }
    }
}

impl StorageConfig {
    /// `<input_dir>/<user>.npy`
    pub fn input_path(&self, user: &str) -> PathBuf {
        self.input_dir.join(format!("{user}.npy"))
    }

    /// `<output_dir>/<user>.csv`
    pub fn output_path(&self, user: &str) -> PathBuf {
        self.output_dir.join(format!("{user}.csv"))
    }
}

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cell-annotator")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from file, or return default if file doesn't exist
pub fn load_config(path: Option<&Path>) -> AppConfig {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
        log::warn!("Could not determine config directory. Using defaults.");
        return AppConfig::default();
    };
    if !path.exists() {
        log::debug!("No config at {}. Using defaults.", path.display());
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to parse config file: {}. Using defaults.", e);
                AppConfig::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file: {}. Using defaults.", e);
            AppConfig::default()
        }
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(content)
}
