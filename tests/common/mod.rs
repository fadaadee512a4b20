// Test helper functions for creating session scenarios
#![allow(dead_code)]

use cell_annotator::config::AppConfig;
use cell_annotator::LabelId;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A scratch data directory laid out like `data/inputs` + `data/outputs`.
pub struct Fixture {
    pub dir: TempDir,
    pub config: AppConfig,
}

impl Fixture {
    pub fn output(&self, user: &str) -> std::path::PathBuf {
        self.config.storage.output_path(user)
    }

    /// Contents of the user's output table, or `None` if never flushed.
    pub fn read_table(&self, user: &str) -> Option<String> {
        fs::read_to_string(self.output(user)).ok()
    }

    /// Write a prior run's table for `user`.
    pub fn write_table(&self, user: &str, rows: &[(usize, u8)]) {
        let mut text = String::from("CellID,ClassID\n");
        for (cell, label) in rows {
            text.push_str(&format!("{cell},{label}\n"));
        }
        let path = self.output(user);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }
}

/// Create a fixture with an `n`-image 4x4x1 sequence for `user`.
pub fn fixture(user: &str, n: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.storage.input_dir = dir.path().join("inputs");
    config.storage.output_dir = dir.path().join("outputs");
    fs::create_dir_all(&config.storage.input_dir).unwrap();
    write_npy(&config.storage.input_path(user), &[n, 4, 4, 1]);
    Fixture { dir, config }
}

/// Write a `|u1` array of the given shape filled with a ramp.
pub fn write_npy(path: &Path, shape: &[usize]) {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    let mut header = format!(
        "{{'descr': '|u1', 'fortran_order': False, 'shape': ({},), }}",
        dims.join(", ")
    );
    // pad so the data starts on a 64-byte boundary, as numpy does
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    let count: usize = shape.iter().product();
    bytes.extend((0..count).map(|i| (i % 251) as u8));
    fs::write(path, bytes).unwrap();
}

pub fn label(id: u8) -> LabelId {
    LabelId::new(id).unwrap()
}
