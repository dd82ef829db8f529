//! CSV output for funding records.
//!
//! Rows are written to a temporary file next to the destination and renamed
//! into place once complete, so a failed or cancelled run never leaves a
//! half-written CSV behind.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::ExportConfig;
use crate::errors::ExportError;
use crate::exchange::FundingRecord;

/// Work out the destination path for this run.
///
/// Uses the configured output or `<coin>_historical_funding_rates.csv`,
/// optionally suffixed with `_YYYYMMDD_HHMMSS`, and always ending in `.csv`.
/// An output naming a directory (existing, or ending in a separator) gets the
/// generated filename inside it.
pub fn resolve_output_path(export: &ExportConfig, now: DateTime<Utc>) -> PathBuf {
    let default_name = format!(
        "{}_historical_funding_rates.csv",
        export.coin.trim().to_lowercase()
    );
    let mut path = match &export.output {
        Some(output) if is_directory(output) => output.join(default_name),
        Some(output) => output.clone(),
        None => PathBuf::from(default_name),
    };

    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some(stem) = name.strip_suffix(".csv") {
        name = stem.to_string();
    }
    if export.timestamped {
        name.push_str(&now.format("_%Y%m%d_%H%M%S").to_string());
    }
    name.push_str(".csv");

    path.set_file_name(name);
    path
}

fn is_directory(path: &Path) -> bool {
    path.is_dir()
        || path
            .as_os_str()
            .to_string_lossy()
            .ends_with(std::path::is_separator)
}

/// Write `records` as CSV to `path`, replacing any existing file.
///
/// The header is always written, so an empty slice produces a header-only file.
pub fn write_records(path: &Path, records: &[FundingRecord]) -> Result<(), ExportError> {
    let io_err = |source: std::io::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source: csv::Error| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = create_temp_in(dir).map_err(io_err)?;
    // Replacing a file keeps its mode; new files get the usual umask-derived one.
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(io_err)?;
    }

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file());

        writer
            .write_record(FundingRecord::CSV_HEADER)
            .map_err(csv_err)?;
        for record in records {
            writer.serialize(record).map_err(csv_err)?;
        }
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn create_temp_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn create_temp_in(dir: &Path) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}
