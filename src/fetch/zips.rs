use anyhow::{bail, Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use url::Url;

/// Download the archive at `url_str` to `dest`, replacing any previous copy.
/// Returns the full path of the saved file.
pub async fn download_zip(
    client: &Client,
    url_str: &str,
    dest: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest = dest.as_ref();
    let url = Url::parse(url_str).with_context(|| format!("parsing download link {}", url_str))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme in download link {}", url);
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let bytes = super::download_to(client, url.as_str(), dest).await?;
    info!(url = %url, bytes, "Zip file {} downloaded", dest.display());

    Ok(dest.to_path_buf())
}
