use anyhow::{Context, Result};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::artifacts::Artifacts;
use crate::fetch::zips::download_zip;

pub mod convert;
pub mod extract;

pub use convert::{convert_file, convert_xml_to_csv, Field, CSV_HEADER};
pub use extract::extract_first_entry;

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("record {record} is missing field {field}")]
    MissingField { field: &'static str, record: u64 },

    #[error("archive {} contains no entries", .0.display())]
    EmptyArchive(PathBuf),

    #[error("archive entry {0:?} is not a safe relative path")]
    UnsafeEntryName(String),

    #[error("archive entry {0:?} is a directory")]
    NotAFile(String),
}

/// Paths and row count produced by one conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub xml: PathBuf,
    pub csv: PathBuf,
    pub rows: u64,
}

/// Download the archive at `url`, extract its dataset and write the CSV.
#[instrument(level = "info", skip(client, artifacts))]
pub async fn download_and_convert(
    client: &Client,
    url: &str,
    artifacts: &Artifacts,
) -> Result<Conversion> {
    let zip_path = download_zip(client, url, &artifacts.zip).await?;

    let work_dir = artifacts.work_dir.clone();
    let csv_path = artifacts.csv.clone();
    // the parse is CPU bound; keep it off the async workers
    let conversion = tokio::task::spawn_blocking(move || -> Result<Conversion> {
        let xml = extract_first_entry(&zip_path, &work_dir)?;
        let rows = convert_file(&xml, &csv_path)?;
        Ok(Conversion {
            xml,
            csv: csv_path,
            rows,
        })
    })
    .await
    .context("conversion task panicked")??;

    info!(
        rows = conversion.rows,
        xml = %conversion.xml.display(),
        csv = %conversion.csv.display(),
        "conversion complete"
    );
    Ok(conversion)
}
