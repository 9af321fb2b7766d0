use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use panel_core::is_plain_report_name;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("refusing to write outside the reports directory: {0}")]
    UnsafeName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the reports directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Saves downloaded reports as `{dir}/{name}`, writing a temp file then renaming,
/// so a failed download never leaves a truncated report behind.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, name: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        if !is_plain_report_name(name) {
            return Err(PersistError::UnsafeName(name.to_string()));
        }
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
