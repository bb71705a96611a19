//! Spreadsheet export of document records.
//!
//! CSV is written with one header row (`nombre_archivo` followed by the ten
//! schema fields) and one row per record; it opens directly in any
//! spreadsheet application. JSON is a pretty-printed array of flat objects.

use crate::error::SmartDocsError;
use crate::record::{DocumentFields, DocumentRecord};
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Output format for [`export_to_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Pick a format from a file extension (`.csv` / `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => Some(ExportFormat::Csv),
            Some("json") => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Column headers, in write order.
pub fn csv_headers() -> Vec<&'static str> {
    std::iter::once("nombre_archivo")
        .chain(DocumentFields::FIELD_NAMES)
        .collect()
}

/// Write records as CSV.
pub fn write_csv<W: Write>(records: &[DocumentRecord], writer: W) -> Result<(), SmartDocsError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let export_err = |e: csv::Error| SmartDocsError::ExportFailed(e.to_string());

    wtr.write_record(csv_headers()).map_err(export_err)?;
    for record in records {
        let row = std::iter::once(record.nombre_archivo.as_str()).chain(record.fields.values());
        wtr.write_record(row).map_err(export_err)?;
    }
    wtr.flush()
        .map_err(|e| SmartDocsError::ExportFailed(e.to_string()))
}

/// Write records as a pretty JSON array.
pub fn write_json<W: Write>(records: &[DocumentRecord], writer: W) -> Result<(), SmartDocsError> {
    serde_json::to_writer_pretty(writer, records)
        .map_err(|e| SmartDocsError::ExportFailed(e.to_string()))
}

/// Write records to `path`, choosing the format from its extension.
///
/// Uses an atomic write (temp file + rename) so a failed export never
/// leaves a half-written spreadsheet behind.
pub fn export_to_file(records: &[DocumentRecord], path: &Path) -> Result<(), SmartDocsError> {
    let format = ExportFormat::from_path(path).ok_or_else(|| {
        SmartDocsError::InvalidConfig(format!(
            "Unsupported export extension for '{}': use .csv or .json",
            path.display()
        ))
    })?;

    let mut buf = Vec::new();
    match format {
        ExportFormat::Csv => write_csv(records, &mut buf)?,
        ExportFormat::Json => write_json(records, &mut buf)?,
    }

    let write_err = |source: std::io::Error| SmartDocsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);
    std::fs::write(tmp_path, &buf).map_err(write_err)?;
    std::fs::rename(tmp_path, path).map_err(write_err)?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
