//! Delimited table reader.
//!
//! The accident export is semicolon-delimited and Latin-1 (ISO-8859-1)
//! encoded. Fields are read as raw bytes and decoded byte-for-byte, since
//! every Latin-1 byte maps to the Unicode code point of the same value.

use std::io::Read;
use std::path::Path;

use road_severity_accident_models::RawTable;

use crate::SourceError;

/// Field delimiter of the accident export.
pub const DELIMITER: u8 = b';';

/// Decodes Latin-1 bytes into a `String`.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Reads the table at `path`.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be opened, or any error
/// from [`read_table_from`].
pub fn read_table(path: &Path) -> Result<RawTable, SourceError> {
    log::info!("Loading {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| SourceError::io(path, e))?;
    let table = read_table_from(std::io::BufReader::new(file), DELIMITER)?;
    log::info!(
        "  {} rows, {} columns",
        table.rows.len(),
        table.headers.len()
    );
    Ok(table)
}

/// Reads a Latin-1 delimited table from any reader.
///
/// Rows may have fewer or more fields than the header. Fields are trimmed.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] on malformed CSV or
/// [`SourceError::EmptyHeader`] if there is no header row.
pub fn read_table_from(reader: impl Read, delimiter: u8) -> Result<RawTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| decode_latin1(h).trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(SourceError::EmptyHeader);
    }

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|field| decode_latin1(field).trim().to_owned())
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_latin1_bytes() {
        // "Vítimas" in ISO-8859-1
        let bytes = b"V\xedtimas";
        assert_eq!(decode_latin1(bytes), "Vítimas");
    }

    #[test]
    fn reads_semicolon_latin1_table() {
        let data: &[u8] = b"id;classificacao_acidente;latitude\n\
            1;Com V\xedtimas Fatais;-23,55\n\
            2;Sem V\xedtimas;-22,90\n";

        let table = read_table_from(data, DELIMITER).unwrap();

        assert_eq!(
            table.headers,
            vec!["id", "classificacao_acidente", "latitude"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "Com Vítimas Fatais");
        assert_eq!(table.rows[1][2], "-22,90");
    }

    #[test]
    fn tolerates_ragged_rows() {
        let data: &[u8] = b"a;b;c\n1;2\n1;2;3;4\n";
        let table = read_table_from(data, DELIMITER).unwrap();
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1].len(), 4);
    }

    #[test]
    fn empty_input_has_no_header() {
        let data: &[u8] = b"";
        assert!(matches!(
            read_table_from(data, DELIMITER),
            Err(SourceError::EmptyHeader)
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("road_severity_reader_missing.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(read_table(&path), Err(SourceError::Io { .. })));
    }
}
