//! Zip archive extraction.
//!
//! The yearly accident export ships as a zip holding a single CSV. Only the
//! first `.csv` entry (case-insensitive) is extracted; other entries are
//! ignored.

use std::path::{Path, PathBuf};

use crate::SourceError;

/// Returns `true` if `path` looks like a zip archive (by extension).
#[must_use]
pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Extracts the first `.csv` entry of `archive_path` into `dest_dir`,
/// returning the extracted file's path.
///
/// Directory components of the entry name are dropped, so the CSV always
/// lands directly inside `dest_dir`.
///
/// # Errors
///
/// Returns [`SourceError::Archive`] if the archive is unreadable,
/// [`SourceError::NoCsvInArchive`] if it holds no CSV, or
/// [`SourceError::Io`] if the file cannot be written.
pub fn extract_first_csv(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf, SourceError> {
    log::info!("Extracting CSV from {}", archive_path.display());

    let file = std::fs::File::open(archive_path).map_err(|e| SourceError::io(archive_path, e))?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| SourceError::Archive {
        path: archive_path.display().to_string(),
        source: e,
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| SourceError::Archive {
            path: archive_path.display().to_string(),
            source: e,
        })?;

        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }

        let Some(file_name) = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(ToOwned::to_owned))
        else {
            log::warn!("  skipping unsafe entry name: {}", entry.name());
            continue;
        };

        std::fs::create_dir_all(dest_dir).map_err(|e| SourceError::io(dest_dir, e))?;

        let dest = dest_dir.join(file_name);
        let mut out = std::fs::File::create(&dest).map_err(|e| SourceError::io(&dest, e))?;
        let bytes = match std::io::copy(&mut entry, &mut out) {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(out);
                let _ = std::fs::remove_file(&dest);
                return Err(SourceError::io(&dest, e));
            }
        };

        #[allow(clippy::cast_precision_loss)]
        let mb = bytes as f64 / 1_048_576.0;
        log::info!("  extracted {} ({mb:.1} MB)", dest.display());

        return Ok(dest);
    }

    Err(SourceError::NoCsvInArchive(
        archive_path.display().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip_writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in entries {
            zip_writer.start_file(*name, options).unwrap();
            zip_writer.write_all(data).unwrap();
        }
        zip_writer.finish().unwrap();
    }

    #[test]
    fn detects_zip_extension() {
        assert!(is_zip(Path::new("dados.zip")));
        assert!(is_zip(Path::new("DADOS.ZIP")));
        assert!(!is_zip(Path::new("dados.csv")));
        assert!(!is_zip(Path::new("dados")));
    }

    #[test]
    fn extracts_first_csv_entry() {
        let tmp = std::env::temp_dir().join("road_severity_archive_extract");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("dados.zip");
        write_zip(
            &zip_path,
            &[
                ("LEIAME.txt", b"notes"),
                ("2023/datatran2023.CSV", b"id;uf\n1;SP\n"),
                ("other.csv", b"id\n2\n"),
            ],
        );

        let out_dir = tmp.join("out");
        let csv_path = extract_first_csv(&zip_path, &out_dir).unwrap();

        assert_eq!(csv_path, out_dir.join("datatran2023.CSV"));
        assert_eq!(std::fs::read(&csv_path).unwrap(), b"id;uf\n1;SP\n");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn archive_without_csv_is_an_error() {
        let tmp = std::env::temp_dir().join("road_severity_archive_no_csv");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("dados.zip");
        write_zip(&zip_path, &[("LEIAME.txt", b"notes")]);

        let result = extract_first_csv(&zip_path, &tmp);
        assert!(matches!(result, Err(SourceError::NoCsvInArchive(_))));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let tmp = std::env::temp_dir().join("road_severity_archive_corrupt");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let zip_path = tmp.join("dados.zip");
        std::fs::write(&zip_path, b"<html>not a zip</html>").unwrap();

        let result = extract_first_csv(&zip_path, &tmp);
        assert!(matches!(result, Err(SourceError::Archive { .. })));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
