//! Saving processed images to local storage
//!
//! The results screen's save action: the processed URI is either streamed
//! down over HTTP or copied from a `file://` location.

use crate::error::{Result, SnapCleanError};
use crate::media::path_from_file_uri;
use crate::tracing_config::spans;
use crate::types::RemovalResult;
use chrono::{DateTime, Local};
use futures_util::stream::TryStreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::Instrument;

/// File name used when the caller gives no file name
#[must_use]
pub fn timestamped_file_name(at: DateTime<Local>) -> String {
    format!("snapclean-{}.png", at.format("%Y%m%d-%H%M%S"))
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}

/// Writes processed images to disk
#[derive(Debug, Clone)]
pub struct ResultExporter {
    client: Client,
    default_dir: PathBuf,
}

impl ResultExporter {
    /// Exporter writing into the user's downloads directory
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new() -> Result<Self> {
        let default_dir = dirs::download_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::with_default_dir(default_dir)
    }

    /// Exporter writing into `dir` when no explicit file is named
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn with_default_dir<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| SnapCleanError::network_error("Failed to create HTTP client", e))?;
        Ok(Self {
            client,
            default_dir: dir.into(),
        })
    }

    #[must_use]
    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    /// Where a save to `target` would land
    ///
    /// `None` or an existing directory gets a timestamped file name.
    #[must_use]
    pub fn resolve_destination(&self, target: Option<&Path>) -> PathBuf {
        let file_name = timestamped_file_name(Local::now());
        match target {
            None => self.default_dir.join(file_name),
            Some(path) if path.is_dir() => path.join(file_name),
            Some(path) => path.to_path_buf(),
        }
    }

    /// Save the processed image of `result`
    ///
    /// # Errors
    /// - The processed URI uses an unsupported scheme
    /// - Network or filesystem failures
    pub async fn save(&self, result: &RemovalResult, target: Option<&Path>) -> Result<PathBuf> {
        let destination = self.resolve_destination(target);
        let uri = result.processed_image_uri.as_str();
        let span = spans::export(uri, &destination);

        async {
            if let Some(parent) = destination.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        SnapCleanError::file_io_error("create directory", parent, &e)
                    })?;
                }
            }

            // A failed save must leave the destination untouched
            let partial = partial_path(&destination);
            let written = self.fetch(uri, &partial).await;
            match written {
                Ok(bytes) => {
                    tokio::fs::rename(&partial, &destination).await.map_err(|e| {
                        SnapCleanError::file_io_error("move saved image", &destination, &e)
                    })?;
                    log::debug!("Wrote {} bytes to {}", bytes, destination.display());
                },
                Err(e) => {
                    if let Err(cleanup_err) = tokio::fs::remove_file(&partial).await {
                        if cleanup_err.kind() != std::io::ErrorKind::NotFound {
                            log::warn!("Failed to clean up {}: {}", partial.display(), cleanup_err);
                        }
                    }
                    return Err(e);
                },
            }

            log::info!("Saved processed image to {}", destination.display());
            Ok(destination.clone())
        }
        .instrument(span)
        .await
    }

    async fn fetch(&self, uri: &str, local_path: &Path) -> Result<u64> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            self.download(uri, local_path).await
        } else if let Some(source) = path_from_file_uri(uri) {
            tokio::fs::copy(&source, local_path)
                .await
                .map_err(|e| SnapCleanError::file_io_error("copy", &source, &e))
        } else {
            Err(SnapCleanError::invalid_image(format!(
                "Cannot save image from '{}'",
                uri
            )))
        }
    }

    async fn download(&self, url: &str, local_path: &Path) -> Result<u64> {
        log::debug!("Downloading: {} -> {}", url, local_path.display());

        let response =
            self.client.get(url).send().await.map_err(|e| {
                SnapCleanError::network_error(format!("Failed to download {}", url), e)
            })?;

        if !response.status().is_success() {
            return Err(SnapCleanError::network_error(
                format!("Failed to download {}", url),
                format!("HTTP {}", response.status().as_u16()),
            ));
        }

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| SnapCleanError::file_io_error("create file", local_path, &e))?;

        let mut stream = StreamReader::new(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let downloaded = tokio::io::copy(&mut stream, &mut file)
            .await
            .map_err(|e| SnapCleanError::network_error("Failed to read download stream", e))?;

        file.flush()
            .await
            .map_err(|e| SnapCleanError::file_io_error("flush file", local_path, &e))?;

        log::debug!(
            "Downloaded {} bytes to {}",
            downloaded,
            local_path.display()
        );
        Ok(downloaded)
    }
}
