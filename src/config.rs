use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Solr select endpoint of the FIRDS file register.
pub const DEFAULT_INDEX_URL: &str =
    "https://registers.esma.europa.eu/solr/esma_registers_firds_files/select";

/// Command-line / environment configuration for a single run.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "firds-dltins",
    about = "Convert the first FIRDS DLTINS file in a publication window to CSV and upload it to S3"
)]
pub struct Config {
    /// Solr select endpoint listing the published files
    #[arg(long, env = "FIRDS_INDEX_URL", default_value = DEFAULT_INDEX_URL)]
    pub index_url: String,

    /// First publication date of the query window (inclusive)
    #[arg(long, env = "FIRDS_FROM", default_value = "2021-01-17")]
    pub from: NaiveDate,

    /// Last publication date of the query window (inclusive)
    #[arg(long, env = "FIRDS_TO", default_value = "2021-01-19")]
    pub to: NaiveDate,

    /// Maximum number of index entries requested
    #[arg(long, env = "FIRDS_ROWS", default_value_t = 100)]
    pub rows: u32,

    /// `file_type` value selecting the entry to convert
    #[arg(long, env = "FIRDS_FILE_TYPE", default_value = "DLTINS")]
    pub file_type: String,

    /// Destination S3 bucket
    #[arg(long, env = "FIRDS_BUCKET", default_value = "steeleye-csv-bucket")]
    pub bucket: String,

    /// Directory receiving the index, archive, extracted XML and CSV
    #[arg(long, env = "FIRDS_WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Log file, opened in append mode
    #[arg(long, env = "FIRDS_LOG_FILE", default_value = "logger.log")]
    pub log_file: PathBuf,

    /// Stop after the CSV is written
    #[arg(long, env = "FIRDS_SKIP_UPLOAD")]
    pub skip_upload: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.from > self.to {
            bail!(
                "publication window is inverted: from {} is after to {}",
                self.from,
                self.to
            );
        }
        if self.rows == 0 {
            bail!("rows must be at least 1");
        }
        if self.file_type.trim().is_empty() {
            bail!("file_type must not be empty");
        }
        if self.bucket.trim().is_empty() {
            bail!("bucket must not be empty");
        }
        Ok(())
    }
}
