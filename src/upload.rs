use anyhow::{anyhow, Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::{primitives::ByteStream, Client};
use std::{future::Future, path::Path};
use tracing::{debug, info, instrument};

/// Destination for the finished CSV.
pub trait ObjectStore {
    /// Store the file at `path` as `bucket/key`, replacing any existing object.
    fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// S3 via the AWS SDK. Credentials and region come from the default
/// provider chain (env, profile, instance metadata).
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn from_env() -> Self {
        let cfg = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&cfg))
    }
}

impl ObjectStore for S3Store {
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        debug!(bucket, key, "putting object");
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(body)
            .send()
            .await?;
        Ok(())
    }
}

/// Object key for a local file: its bare file name, no prefix.
pub fn object_key(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))
}

/// Upload the CSV at `path` to `bucket` under its own file name.
#[instrument(level = "info", skip(store, path), fields(path = %path.display()))]
pub async fn upload_csv<S: ObjectStore>(store: &S, bucket: &str, path: &Path) -> Result<String> {
    let key = object_key(path)?;
    store
        .put_file(bucket, &key, path)
        .await
        .with_context(|| format!("uploading {} to s3://{}/{}", path.display(), bucket, key))?;
    info!(bucket, key = %key, "csv uploaded");
    Ok(key)
}
