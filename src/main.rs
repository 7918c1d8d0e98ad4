use anyhow::Result;
use clap::Parser;
use firds_dltins::{logging, pipeline, Config, S3Store};
use reqwest::Client;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init(&config.log_file)?;
    info!(
        index_url = %config.index_url,
        from = %config.from,
        to = %config.to,
        file_type = %config.file_type,
        bucket = %config.bucket,
        work_dir = %config.work_dir.display(),
        "startup"
    );

    // ─── 2) clients ──────────────────────────────────────────────────
    let client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let store = S3Store::from_env().await;

    // ─── 3) run ──────────────────────────────────────────────────────
    match pipeline::run(&config, &client, &store).await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(e) => {
            error!(error = ?e, "pipeline failed");
            Err(e)
        }
    }
}
