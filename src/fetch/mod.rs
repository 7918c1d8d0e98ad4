use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument};

/// Locating the target file in the FIRDS index
pub mod index;
/// Downloading the dataset archive
pub mod zips;

/// GET `url` and return the raw body. Non-success statuses are errors.
pub async fn download(client: &Client, url: &str) -> Result<Vec<u8>> {
    debug!("Fetching {}", url);
    let bytes = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?
        .bytes()
        .await
        .with_context(|| format!("Reading body from {}", url))?;
    Ok(bytes.to_vec())
}

/// GET `url` and stream the body into `dest`, truncating any previous
/// content. Returns the number of bytes written.
#[instrument(level = "debug", skip(client, dest), fields(dest = %dest.as_ref().display()))]
pub async fn download_to(client: &Client, url: &str, dest: impl AsRef<Path>) -> Result<u64> {
    let dest = dest.as_ref();
    let mut resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?
        .error_for_status()
        .with_context(|| format!("Non-success status {}", url))?;

    let mut file = fs::File::create(dest)
        .await
        .with_context(|| format!("creating {}", dest.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = resp
        .chunk()
        .await
        .with_context(|| format!("Reading body from {}", url))?
    {
        file.write_all(&chunk)
            .await
            .with_context(|| format!("writing {}", dest.display()))?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(bytes = written, "download complete");
    Ok(written)
}
