use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

pub const INDEX_FILE_NAME: &str = "esma_registers_firds_files.xml";
pub const ZIP_FILE_NAME: &str = "second_xml.zip";
pub const CSV_FILE_NAME: &str = "DLTINS.csv";

/// Fixed locations of the files a run leaves behind. Every run truncates
/// and rewrites them; nothing is cleaned up afterwards.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub work_dir: PathBuf,
    pub index: PathBuf,
    pub zip: PathBuf,
    pub csv: PathBuf,
}

impl Artifacts {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            index: work_dir.join(INDEX_FILE_NAME),
            zip: work_dir.join(ZIP_FILE_NAME),
            csv: work_dir.join(CSV_FILE_NAME),
            work_dir,
        }
    }

    /// Create the work directory if needed.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.work_dir)
            .with_context(|| format!("creating work directory {}", self.work_dir.display()))
    }
}
