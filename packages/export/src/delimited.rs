//! UTF-8 CSV writers. Every file starts with a byte-order mark.

use std::io::Write as _;
use std::path::Path;

use road_severity_model::ImportanceRanking;

use crate::ExportError;
use crate::sheet::Sheet;

const BOM: &[u8] = b"\xEF\xBB\xBF";

type CsvWriter = csv::Writer<std::io::BufWriter<std::fs::File>>;

fn create_writer(path: &Path) -> Result<CsvWriter, ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut out = std::io::BufWriter::new(file);
    out.write_all(BOM).map_err(|e| ExportError::io(path, e))?;
    Ok(csv::Writer::from_writer(out))
}

/// Removes the file at `path` when `result` is an error, so a failed write
/// never leaves a truncated CSV behind.
fn discard_on_error<T>(path: &Path, result: Result<T, ExportError>) -> Result<T, ExportError> {
    if result.is_err()
        && let Err(e) = std::fs::remove_file(path)
    {
        log::warn!("Failed to remove partial file {}: {e}", path.display());
    }
    result
}

fn write_sheet_rows(sheet: &Sheet, path: &Path, mut writer: CsvWriter) -> Result<(), ExportError> {
    writer
        .write_record(&sheet.headers)
        .map_err(|e| ExportError::csv(path, e))?;
    for row in &sheet.rows {
        writer
            .write_record(row.iter().map(crate::sheet::Cell::render))
            .map_err(|e| ExportError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ExportError::io(path, e))
}

/// Writes a sheet as CSV with a header row.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_sheet(sheet: &Sheet, path: &Path) -> Result<(), ExportError> {
    let writer = create_writer(path)?;
    discard_on_error(path, write_sheet_rows(sheet, path, writer))
}

fn write_importance_rows(
    ranking: &ImportanceRanking,
    path: &Path,
    mut writer: CsvWriter,
) -> Result<(), ExportError> {
    for entry in ranking.entries() {
        writer
            .serialize(entry)
            .map_err(|e| ExportError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ExportError::io(path, e))
}

/// Writes every ranked feature as `variavel,importancia`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be created or written.
pub fn write_importances(ranking: &ImportanceRanking, path: &Path) -> Result<(), ExportError> {
    let writer = create_writer(path)?;
    discard_on_error(path, write_importance_rows(ranking, path, writer))?;

    log::info!(
        "Wrote {} feature importances to {}",
        ranking.len(),
        path.display()
    );
    Ok(())
}
