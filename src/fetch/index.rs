use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::path::Path;
use tracing::{debug, info, instrument, trace};
use url::Url;

use crate::config::Config;

const DOWNLOAD_LINK: &str = "download_link";
const FILE_TYPE: &str = "file_type";

#[derive(thiserror::Error, Debug)]
pub enum LocateError {
    #[error("no entry with file_type {file_type} found in index")]
    NoMatchingLink { file_type: String },
}

/// Build the Solr query for every file published inside the configured window.
pub fn index_url(config: &Config) -> Result<Url> {
    let mut url = Url::parse(&config.index_url)
        .with_context(|| format!("parsing index URL {}", config.index_url))?;
    let window = format!(
        "publication_date:[{}T00:00:00Z TO {}T23:59:59Z]",
        config.from.format("%Y-%m-%d"),
        config.to.format("%Y-%m-%d"),
    );
    url.query_pairs_mut()
        .clear()
        .append_pair("q", "*")
        .append_pair("fq", &window)
        .append_pair("wt", "xml")
        .append_pair("indent", "true")
        .append_pair("start", "0")
        .append_pair("rows", &config.rows.to_string());
    Ok(url)
}

/// Scan the flat `<str name="…">` pairs of the index and return the
/// `download_link` belonging to the first entry whose `file_type` equals
/// `file_type`.
///
/// The most recently seen link is paired with a matching `file_type`. A new
/// `<doc>` forgets the previous link; if the matching `file_type` comes
/// first within its group, the next link is returned instead.
pub fn locate_download_link(xml: &str, file_type: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut key: Option<String> = None;
    let mut link: Option<String> = None;
    let mut matched = false;

    loop {
        match reader.read_event().context("parsing index document")? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"doc" => {
                    link = None;
                    matched = false;
                }
                b"str" => {
                    key = match e.try_get_attribute("name")? {
                        Some(attr) => Some(attr.unescape_value()?.into_owned()),
                        None => None,
                    };
                }
                _ => {}
            },
            Event::Text(t) => {
                let Some(name) = key.as_deref() else { continue };
                let value = t.unescape()?;
                match name {
                    DOWNLOAD_LINK => {
                        trace!(link = %value, "seen download link");
                        if matched {
                            return Ok(value.into_owned());
                        }
                        link = Some(value.into_owned());
                    }
                    FILE_TYPE if &*value == file_type => {
                        if let Some(link) = link.take() {
                            return Ok(link);
                        }
                        matched = true;
                    }
                    _ => {}
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"str" => key = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Err(LocateError::NoMatchingLink {
        file_type: file_type.to_string(),
    }
    .into())
}

/// Fetch the index, keep a copy at `dest` and locate the configured file type.
#[instrument(level = "info", skip_all, fields(file_type = %config.file_type))]
pub async fn fetch_download_link(client: &Client, config: &Config, dest: &Path) -> Result<String> {
    let url = index_url(config)?;
    debug!(%url, "fetching index");
    let body = super::download(client, url.as_str()).await?;
    tokio::fs::write(dest, &body)
        .await
        .with_context(|| format!("writing {}", dest.display()))?;
    info!(bytes = body.len(), dest = %dest.display(), "index saved");

    let xml = std::str::from_utf8(&body).context("index document is not valid utf-8")?;
    let link = locate_download_link(xml, &config.file_type)?;
    info!(
        link = %link,
        "First download link whose file_type is {}", config.file_type
    );
    Ok(link)
}
