#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Inference over the full enriched table and artifact writers.
//!
//! The scored table is written as a single-sheet `.xlsx` workbook. If the
//! workbook cannot be written, a UTF-8 CSV (with byte-order mark, so
//! spreadsheet tools detect the encoding) is written next to it instead.
//! Feature importances always go to CSV.

pub mod delimited;
pub mod inference;
pub mod sheet;
pub mod xlsx;

use std::path::{Path, PathBuf};

use road_severity_accident_models::ScoredTable;

pub use inference::score;
pub use sheet::{Cell, Sheet};

/// Errors that can occur while writing output artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// I/O error at a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Writing the workbook archive failed.
    #[error("Failed to write workbook {path}: {source}")]
    Xlsx {
        /// Workbook path.
        path: String,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// Writing a CSV file failed.
    #[error("Failed to write CSV {path}: {source}")]
    Csv {
        /// CSV path.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

impl ExportError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Path of the CSV written when the workbook at `path` cannot be.
#[must_use]
pub fn fallback_path(path: &Path) -> PathBuf {
    path.with_extension("csv")
}

/// Writes the scored table to `path` as a workbook, falling back to CSV.
///
/// Returns the path that was actually written.
///
/// # Errors
///
/// Returns an [`ExportError`] only if both the workbook and the CSV
/// fallback fail.
pub fn write_scored_table(table: &ScoredTable, path: &Path) -> Result<PathBuf, ExportError> {
    let sheet = Sheet::from_scored(table);

    match xlsx::write_workbook(&sheet, path) {
        Ok(()) => {
            log::info!(
                "Wrote {} rows x {} columns to {}",
                sheet.rows.len(),
                sheet.headers.len(),
                path.display()
            );
            Ok(path.to_path_buf())
        }
        Err(e) => {
            log::warn!("Could not write workbook ({e}), falling back to CSV");
            if path.exists()
                && let Err(e) = std::fs::remove_file(path)
            {
                log::warn!("Failed to remove partial workbook {}: {e}", path.display());
            }

            let csv_path = fallback_path(path);
            delimited::write_sheet(&sheet, &csv_path)?;
            log::info!(
                "Wrote {} rows x {} columns to {}",
                sheet.rows.len(),
                sheet.headers.len(),
                csv_path.display()
            );
            Ok(csv_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_replaces_extension() {
        assert_eq!(
            fallback_path(Path::new("out/dados_sinistros_para_looker.xlsx")),
            PathBuf::from("out/dados_sinistros_para_looker.csv")
        );
        assert_eq!(fallback_path(Path::new("saida")), PathBuf::from("saida.csv"));
    }

    #[test]
    fn falls_back_to_csv_when_workbook_cannot_be_written() {
        let tmp = std::env::temp_dir().join("road_severity_export_fallback_test");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        // A directory at the workbook path makes file creation fail.
        let path = tmp.join("saida.xlsx");
        std::fs::create_dir_all(&path).unwrap();

        let written = write_scored_table(&ScoredTable::default(), &path).unwrap();
        assert_eq!(written, tmp.join("saida.csv"));

        let bytes = std::fs::read(&written).unwrap();
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn writes_workbook_when_possible() {
        let tmp = std::env::temp_dir().join("road_severity_export_workbook_test");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let path = tmp.join("saida.xlsx");
        let written = write_scored_table(&ScoredTable::default(), &path).unwrap();
        assert_eq!(written, path);
        assert!(!tmp.join("saida.csv").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
