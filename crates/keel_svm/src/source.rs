//! Where release listings and binaries come from.

use crate::error::SvmError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Download progress callback: bytes received so far, and the total when the
/// server announced it.
pub type Progress<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Total time allowed for one binary download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// A transport for release listings and binaries.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches `url` fully into memory, failing after `timeout`.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, SvmError>;

    /// Streams `url` into the file at `dest`, replacing it.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<Progress<'_>>,
    ) -> Result<(), SvmError>;
}

/// [`ReleaseSource`] over HTTPS.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Creates a source with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

fn download_error(url: &str, e: reqwest::Error) -> SvmError {
    SvmError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl ReleaseSource for HttpSource {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, SvmError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| download_error(url, e))?;
        let bytes = response.bytes().await.map_err(|e| download_error(url, e))?;
        Ok(bytes.to_vec())
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<Progress<'_>>,
    ) -> Result<(), SvmError> {
        let mut response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| download_error(url, e))?;
        let total = response.content_length();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| SvmError::io(dest, e))?;
        let mut received = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| download_error(url, e))? {
            file.write_all(&chunk)
                .await
                .map_err(|e| SvmError::io(dest, e))?;
            received += chunk.len() as u64;
            if let Some(progress) = progress {
                progress(received, total);
            }
        }
        file.flush().await.map_err(|e| SvmError::io(dest, e))?;
        Ok(())
    }
}
