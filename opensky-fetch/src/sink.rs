//! Persist raw feed responses exactly as received.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes response bodies to a file without transformation.
pub struct RawSink {
    path: PathBuf,
}

impl RawSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RawSink { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file contents with `raw`.
    pub fn write(&self, raw: &[u8]) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, raw)
    }
}
