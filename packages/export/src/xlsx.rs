//! Minimal single-sheet `.xlsx` writer.
//!
//! A workbook is a zip of `SpreadsheetML` parts. Only the parts a
//! spreadsheet application needs to open one worksheet are written. Text
//! uses inline strings, numbers use plain numeric cells.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use zip::write::SimpleFileOptions;

use crate::ExportError;
use crate::sheet::{Cell, Sheet};

/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

/// Spreadsheet column letters for a zero-based index (`0` is `A`, `26` is
/// `AA`).
#[must_use]
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        #[allow(clippy::cast_possible_truncation)]
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().map(|&b| char::from(b)).collect()
}

/// Escapes text for XML content and drops characters XML 1.0 forbids.
#[must_use]
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < ' ' => {}
            c => out.push(c),
        }
    }
    out
}

fn push_cell(xml: &mut String, reference: &str, cell: &Cell) {
    match cell {
        Cell::Text(s) => {
            let _ = write!(
                xml,
                r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                escape_xml(s)
            );
        }
        Cell::Number(n) if n.is_finite() => {
            let _ = write!(xml, r#"<c r="{reference}"><v>{n}</v></c>"#);
        }
        Cell::Number(_) | Cell::Empty => {}
    }
}

fn push_row(xml: &mut String, row_number: usize, cells: impl Iterator<Item = Cell>) {
    let _ = write!(xml, r#"<row r="{row_number}">"#);
    for (col, cell) in cells.enumerate() {
        let reference = format!("{}{row_number}", column_letters(col));
        push_cell(xml, &reference, &cell);
    }
    xml.push_str("</row>");
}

const WORKSHEET_OPEN: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#;

const WORKSHEET_CLOSE: &str = "</sheetData></worksheet>";

/// Streams the worksheet part for `sheet` into `out`, header in row 1.
/// Only one row is buffered at a time.
///
/// # Errors
///
/// Returns the first write error from `out`.
pub fn write_worksheet<W: std::io::Write>(sheet: &Sheet, out: &mut W) -> std::io::Result<()> {
    out.write_all(WORKSHEET_OPEN.as_bytes())?;

    let mut row_xml = String::new();
    push_row(
        &mut row_xml,
        1,
        sheet.headers.iter().map(|h| Cell::Text(h.clone())),
    );
    out.write_all(row_xml.as_bytes())?;

    for (i, row) in sheet.rows.iter().enumerate() {
        row_xml.clear();
        push_row(&mut row_xml, i + 2, row.iter().cloned());
        out.write_all(row_xml.as_bytes())?;
    }

    out.write_all(WORKSHEET_CLOSE.as_bytes())
}

/// Writes `sheet` as a single-sheet workbook at `path`.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be created or written and
/// [`ExportError::Xlsx`] if the archive cannot be assembled.
pub fn write_workbook(sheet: &Sheet, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut zip = zip::ZipWriter::new(std::io::BufWriter::new(file));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let zip_err = |source| ExportError::Xlsx {
        path: path.display().to_string(),
        source,
    };

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
    ];

    for (name, content) in parts {
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(content.as_bytes())
            .map_err(|e| ExportError::io(path, e))?;
    }

    zip.start_file("xl/worksheets/sheet1.xml", options)
        .map_err(zip_err)?;
    write_worksheet(sheet, &mut zip).map_err(|e| ExportError::io(path, e))?;

    let mut writer = zip.finish().map_err(zip_err)?;
    writer.flush().map_err(|e| ExportError::io(path, e))?;

    Ok(())
}
