#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident dataset acquisition and normalization.
//!
//! Covers everything between "a URL or a file on disk" and an
//! [`EnrichedTable`](road_severity_accident_models::EnrichedTable):
//! downloading the yearly archive, extracting its CSV, reading the
//! semicolon-delimited Latin-1 table, normalizing it to typed
//! [`AccidentRecord`](road_severity_accident_models::AccidentRecord)s and
//! deriving the calendar and severity fields.

pub mod archive;
pub mod download;
pub mod enrich;
pub mod normalize;
pub mod parsing;
pub mod reader;

use road_severity_accident_models::Column;

/// Errors that can occur while acquiring or normalizing the dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error at a specific path.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The archive could not be opened or read.
    #[error("Invalid archive {path}: {source}")]
    Archive {
        /// Archive path.
        path: String,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// The archive holds no `.csv` entry.
    #[error("No CSV file found in archive {0}")]
    NoCsvInArchive(String),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// The table has no header row.
    #[error("Table has no header row")]
    EmptyHeader,

    /// A column required by the validity gate is absent from the table.
    #[error("Mandatory column '{column}' is missing from the input table")]
    MissingColumn {
        /// The absent column.
        column: Column,
    },
}

impl SourceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
