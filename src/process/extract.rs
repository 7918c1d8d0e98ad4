use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, instrument};
use zip::ZipArchive;

use super::ConvertError;

/// Write the first entry of the archive at `zip_path` into `dest_dir`,
/// keeping its name, and return the path that was actually written.
#[instrument(level = "info", skip_all, fields(zip = %zip_path.display()))]
pub fn extract_first_entry(zip_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file = File::open(zip_path).with_context(|| format!("opening {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("reading archive {}", zip_path.display()))?;
    if archive.len() == 0 {
        return Err(ConvertError::EmptyArchive(zip_path.to_path_buf()).into());
    }

    let mut entry = archive.by_index(0)?;
    let name = entry.name().to_string();
    if entry.is_dir() {
        return Err(ConvertError::NotAFile(name).into());
    }
    let rel = entry
        .enclosed_name()
        .ok_or_else(|| ConvertError::UnsafeEntryName(name.clone()))?;

    let dest = dest_dir.join(rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(
        File::create(&dest).with_context(|| format!("creating {}", dest.display()))?,
    );
    let bytes = io::copy(&mut entry, &mut out).with_context(|| format!("extracting {}", name))?;
    out.flush()?;

    info!(entry = %name, bytes, "{} file extracted", zip_path.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extracts_only_the_first_entry() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("second_xml.zip");
        write_zip(
            &zip_path,
            &[
                ("DLTINS_20210117_01of01.xml", "<a/>"),
                ("other.xml", "<b/>"),
            ],
        );

        let out = extract_first_entry(&zip_path, dir.path())?;
        assert_eq!(out, dir.path().join("DLTINS_20210117_01of01.xml"));
        assert_eq!(fs::read(&out)?, b"<a/>");
        assert!(!dir.path().join("other.xml").exists());
        Ok(())
    }

    #[test]
    fn empty_archive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("empty.zip");
        write_zip(&zip_path, &[]);
        let err = extract_first_entry(&zip_path, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::EmptyArchive(_))
        ));
    }

    #[test]
    fn traversal_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("evil.zip");
        write_zip(&zip_path, &[("../evil.xml", "<a/>")]);
        let err = extract_first_entry(&zip_path, &dir.path().join("out")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::UnsafeEntryName(n)) if n == "../evil.xml"
        ));
        assert!(!dir.path().join("evil.xml").exists());
    }

    #[test]
    fn not_a_zip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bogus.zip");
        fs::write(&zip_path, b"<html>503 Service Unavailable</html>").unwrap();
        let err = extract_first_entry(&zip_path, dir.path()).unwrap_err();
        assert!(err.to_string().contains("reading archive"));
    }
}
