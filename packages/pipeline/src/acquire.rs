//! Locating the input table: local file, local archive, or download.

use std::path::{Path, PathBuf};

use road_severity_source::SourceError;
use road_severity_source::archive::{extract_first_csv, is_zip};
use road_severity_source::download::{archive_path, download_file, resolve_dataset_url};

use crate::config::PipelineConfig;

/// The CSV to read and the files created to obtain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquired {
    pub csv: PathBuf,
    /// Files created by acquisition, removed by [`cleanup`]. Never
    /// includes a user-supplied input.
    pub temp_files: Vec<PathBuf>,
}

/// Resolves the input CSV, extracting or downloading as needed.
///
/// # Errors
///
/// Returns [`SourceError`] if the download or extraction fails. A
/// downloaded archive is removed before returning the error unless
/// `keep_temp` is set.
pub async fn acquire(config: &PipelineConfig) -> Result<Acquired, SourceError> {
    if let Some(input) = &config.input {
        if is_zip(input) {
            let csv = extract_first_csv(input, &config.work_dir)?;
            return Ok(Acquired {
                temp_files: vec![csv.clone()],
                csv,
            });
        }
        return Ok(Acquired {
            csv: input.clone(),
            temp_files: Vec::new(),
        });
    }

    let url = resolve_dataset_url(config.url.clone());
    let archive = archive_path(&config.work_dir, config.year);
    let extracted = download_file(&url, &archive)
        .await
        .and_then(|_| extract_first_csv(&archive, &config.work_dir));

    match extracted {
        Ok(csv) => Ok(Acquired {
            temp_files: vec![archive, csv.clone()],
            csv,
        }),
        Err(e) => {
            if config.keep_temp {
                log::info!("Keeping {} after failed acquisition", archive.display());
            } else {
                remove_quietly(&archive);
            }
            Err(e)
        }
    }
}

/// Removes files created by the pipeline. Failures are logged, never
/// returned.
pub fn cleanup(paths: &[PathBuf]) {
    for path in paths {
        remove_quietly(path);
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
    }
}
