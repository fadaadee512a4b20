slint::include_modules!();

mod callbacks;
mod utils;

use cell_annotator::classes::LABEL_NAMES;
use cell_annotator::config::load_config;
use cell_annotator::{Session, SessionError};
use clap::Parser;
use slint::{ModelRc, SharedString, VecModel};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

const INVALID_REQUEST: &str = "Invalid request (incorrect or no username provided).";

#[derive(Debug, Parser)]
#[command(name = "cell-annotator", about = "Label pre-extracted cell images one at a time")]
struct Cli {
    /// User identifier; selects `<input_dir>/<user>.npy` and `<output_dir>/<user>.csv`
    #[arg(short, long)]
    user: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override `storage.input_dir`
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Override `storage.output_dir`
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref());
    if let Some(dir) = cli.input_dir {
        config.storage.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.storage.output_dir = dir;
    }

    let ui = AppWindow::new()?;
    let names: Vec<SharedString> = LABEL_NAMES.iter().map(|n| SharedString::from(*n)).collect();
    ui.set_label_names(ModelRc::new(VecModel::from(names)));

    let session = match cli.user.as_deref() {
        Some(user) => Session::initialize(user, &config),
        None => Err(SessionError::InvalidUser(String::new())),
    };

    match session {
        Ok(session) => {
            let mut channel = config.session.display_channel;
            if channel >= session.images().channels() {
                log::warn!(
                    "Display channel {} out of range ({} channels); showing channel 0",
                    channel,
                    session.images().channels()
                );
                channel = 0;
            }
            callbacks::render(&ui, &session, &session.view(), channel);
            ui.set_ready(true);
            callbacks::setup_annotation_callbacks(&ui, Rc::new(RefCell::new(session)), channel);
        }
        Err(e) => {
            log::error!("Could not start session: {e}");
            ui.set_status_text(INVALID_REQUEST.into());
        }
    }

    ui.run()?;
    Ok(())
}
