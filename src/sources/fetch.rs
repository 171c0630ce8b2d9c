//! Archive downloads.
//!
//! Downloads stream into `<dest>.part` and are renamed into place once the
//! body has been read completely, so an interrupted transfer never leaves a
//! file that looks finished.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::util::errors::ContribsError;
use crate::util::shell::Shell;

/// Downloads a URL to a file.
pub trait Fetcher {
    /// Download `url` to `dest`, replacing whatever is there.
    fn fetch(&self, url: &Url, dest: &Path) -> Result<()>;
}

/// HTTP(S) downloads over a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    shell: Arc<Shell>,
}

impl HttpFetcher {
    pub fn new(shell: Arc<Shell>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("contribs/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(None)
            .build()
            .context("failed to create HTTP client")?;

        Ok(HttpFetcher { client, shell })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<()> {
        tracing::debug!("Downloading {} to {}", url, dest.display());

        let fetch_error = |reason: String| ContribsError::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)).into());
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let part = part_path(dest);
        let label = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        let mut progress = self.shell.bytes_progress(label, response.content_length());

        let result = (|| -> Result<()> {
            let mut file = File::create(&part)
                .with_context(|| format!("failed to create {}", part.display()))?;
            let mut buf = [0u8; 64 * 1024];
            loop {
                let n = response
                    .read(&mut buf)
                    .map_err(|e| fetch_error(e.to_string()))?;
                if n == 0 {
                    break;
                }
                file.write_all(&buf[..n])
                    .with_context(|| format!("failed to write {}", part.display()))?;
                progress.inc(n as u64);
            }
            file.flush()?;
            Ok(())
        })();
        progress.finish();

        if let Err(e) = result {
            let _ = std::fs::remove_file(&part);
            return Err(e);
        }

        std::fs::rename(&part, dest).with_context(|| {
            format!(
                "failed to move {} to {}",
                part.display(),
                dest.display()
            )
        })?;

        tracing::debug!("Downloaded {} bytes from {}", progress.position(), url);
        Ok(())
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
