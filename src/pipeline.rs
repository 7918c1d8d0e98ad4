use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::{path::PathBuf, time::Instant};
use tracing::{info, info_span, Instrument};

use crate::{
    artifacts::Artifacts,
    config::Config,
    fetch::index::fetch_download_link,
    process::download_and_convert,
    upload::{upload_csv, ObjectStore},
};

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub download_link: String,
    pub csv_path: PathBuf,
    pub rows: u64,
    /// `None` when the upload was skipped.
    pub object_key: Option<String>,
    pub elapsed_seconds: f64,
}

/// Run the four steps in order. The first failing step ends the run; later
/// steps never see its output.
pub async fn run<S: ObjectStore>(config: &Config, client: &Client, store: &S) -> Result<RunSummary> {
    config.validate()?;
    let start = Instant::now();
    let artifacts = Artifacts::new(&config.work_dir);
    artifacts.prepare()?;

    // ─── 1+2) fetch index & locate link ─────────────────────────────
    let download_link = fetch_download_link(client, config, &artifacts.index)
        .instrument(info_span!("locate"))
        .await
        .context("locating download link")?;

    // ─── 3) download, extract & convert ─────────────────────────────
    let conversion = download_and_convert(client, &download_link, &artifacts)
        .instrument(info_span!("convert"))
        .await
        .context("converting dataset to csv")?;

    // ─── 4) upload ──────────────────────────────────────────────────
    let object_key = if config.skip_upload {
        info!("upload skipped");
        None
    } else {
        let key = upload_csv(store, &config.bucket, &conversion.csv)
            .instrument(info_span!("upload"))
            .await
            .context("uploading csv")?;
        Some(key)
    };

    let summary = RunSummary {
        download_link,
        csv_path: conversion.csv,
        rows: conversion.rows,
        object_key,
        elapsed_seconds: start.elapsed().as_secs_f64(),
    };
    info!(
        rows = summary.rows,
        elapsed = ?start.elapsed(),
        "pipeline complete"
    );
    Ok(summary)
}
