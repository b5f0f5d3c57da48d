//! Dataset download helpers.
//!
//! Fetches the yearly accident archive from its storage location and
//! streams it to a local file in the work directory.

use std::path::{Path, PathBuf};

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

use crate::SourceError;

/// Default location of the accident archive. `confirm=t` skips the
/// interstitial page the storage host serves for large files.
pub const DEFAULT_DATASET_URL: &str =
    "https://drive.google.com/uc?export=download&id=1-caam_dahYOf2eorq4mez04Om6DD5d_3&confirm=t";

/// Environment variable that overrides [`DEFAULT_DATASET_URL`].
pub const DATASET_URL_ENV: &str = "ROAD_SEVERITY_DATASET_URL";

/// Returns the dataset URL to use: the explicit value, else
/// `ROAD_SEVERITY_DATASET_URL`, else [`DEFAULT_DATASET_URL`].
#[must_use]
pub fn resolve_dataset_url(cli_url: Option<String>) -> String {
    cli_url
        .or_else(|| std::env::var(DATASET_URL_ENV).ok())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DATASET_URL.to_string())
}

/// File name of the downloaded archive for an analysis year.
#[must_use]
pub fn archive_file_name(year: i32) -> String {
    format!("dados_acidentes_{year}.zip")
}

/// Path the archive for `year` is downloaded to inside `work_dir`.
#[must_use]
pub fn archive_path(work_dir: &Path, year: i32) -> PathBuf {
    work_dir.join(archive_file_name(year))
}

/// Bytes between two progress log lines.
const LOG_EVERY_BYTES: u64 = 10 * 1_048_576;

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / 1_048_576.0
}

/// Streams `url` into `dest`, creating parent directories as needed.
/// Returns the number of bytes written.
///
/// # Errors
///
/// * [`SourceError::Http`] if the request or the body stream fails
/// * [`SourceError::HttpStatus`] for a non-success response
/// * [`SourceError::Io`] if `dest` cannot be written
pub async fn download_file(url: &str, dest: &Path) -> Result<u64, SourceError> {
    log::info!("Downloading dataset archive from {url} to {}", dest.display());

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SourceError::io(parent, e))?;
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("road-severity/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let expected = response.content_length();
    if let Some(size) = expected {
        log::info!("Archive size: {:.1} MB", megabytes(size));
    }

    let file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| SourceError::io(dest, e))?;
    let mut writer = tokio::io::BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    let mut next_log = LOG_EVERY_BYTES;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| SourceError::io(dest, e))?;
        written += chunk.len() as u64;

        if written >= next_log {
            next_log = written + LOG_EVERY_BYTES;
            match expected {
                #[allow(clippy::cast_precision_loss)]
                Some(total) if total > 0 => log::info!(
                    "Downloaded {:.0} MB ({:.0}%)",
                    megabytes(written),
                    written as f64 / total as f64 * 100.0
                ),
                _ => log::info!("Downloaded {:.0} MB", megabytes(written)),
            }
        }
    }

    writer.flush().await.map_err(|e| SourceError::io(dest, e))?;
    log::info!("Download complete: {:.1} MB", megabytes(written));

    Ok(written)
}
