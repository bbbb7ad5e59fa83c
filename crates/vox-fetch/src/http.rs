//! HTTP client that downloads audio files chunk by chunk.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use vox_types::{AudioFetcher, FetchError};

/// Fetcher backed by a shared `reqwest::Client`.
pub struct HttpAudioFetcher {
    client: reqwest::Client,
}

impl HttpAudioFetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpAudioFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Local file name for a download: `<prefix>_<last url path segment>`.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`; an empty segment becomes `audio`.
pub fn file_name_for(prefix: &str, url: &str) -> String {
    let segment = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut s| s.next_back().map(str::to_string))
            .unwrap_or_default(),
        Err(_) => url.rsplit('/').next().unwrap_or_default().to_string(),
    };
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        format!("{}_audio", prefix)
    } else {
        format!("{}_{}", prefix, cleaned)
    }
}

#[async_trait::async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, FetchError> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(file_name);

        let mut res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut written: u64 = 0;
        loop {
            let chunk = match res.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(FetchError::Transport {
                        url: url.to_string(),
                        message: e.to_string(),
                    });
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        tracing::debug!(url = %url, path = %path.display(), bytes = written, "audio downloaded");
        Ok(path)
    }
}
