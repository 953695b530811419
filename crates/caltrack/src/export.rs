//! CSV and PDF-table export of the displayed devices.
//!
//! The PDF itself is drawn by an external renderer; this module hands it a
//! JSON table whose cells are already accent-free.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::Device;
use crate::report::{ReportContext, ReportRow};
use crate::text::strip_diacritics;

/// Byte-order mark prefixed to CSV output so spreadsheet tools detect UTF-8.
pub const BOM: char = '\u{FEFF}';

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Quoted CSV with BOM.
    Csv,
    /// JSON table for the PDF renderer.
    Pdf,
}

impl ExportFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Pdf => "json",
        }
    }
}

/// Quote a single CSV cell, doubling embedded quotes.
#[must_use]
pub fn quote_cell(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn csv_line<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells
        .into_iter()
        .map(quote_cell)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render devices as CSV with localized headers.
#[must_use]
pub fn render_csv<'a>(devices: impl IntoIterator<Item = &'a Device>, ctx: &ReportContext) -> String {
    let mut lines = vec![csv_line(ctx.locale.report_headers())];
    lines.extend(
        devices
            .into_iter()
            .map(|device| csv_line(ReportRow::project(device, ctx).cells())),
    );
    format!("{BOM}{}", lines.join("\n"))
}

/// Table handed to the PDF renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfTable {
    /// Document title.
    pub title: String,
    /// Generation date, formatted for the locale.
    pub generated: String,
    /// Column headers.
    pub head: Vec<String>,
    /// Row cells.
    pub body: Vec<Vec<String>>,
}

impl PdfTable {
    /// Build the table from devices, stripping accents from every cell.
    #[must_use]
    pub fn build<'a>(devices: impl IntoIterator<Item = &'a Device>, ctx: &ReportContext) -> Self {
        Self {
            title: strip_diacritics(ctx.locale.export_file_stem()),
            generated: ctx.locale.format_date(ctx.today),
            head: ctx
                .locale
                .report_headers()
                .iter()
                .map(|header| strip_diacritics(header))
                .collect(),
            body: devices
                .into_iter()
                .map(|device| {
                    ReportRow::project_for_pdf(device, ctx)
                        .cells()
                        .iter()
                        .map(ToString::to_string)
                        .collect()
                })
                .collect(),
        }
    }

    /// Serialize the table as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Default export file path: `<dir>/<stem>_<yyyy-mm-dd>.<ext>`.
#[must_use]
pub fn default_output_path(dir: &Path, ctx: &ReportContext, format: ExportFormat) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        ctx.locale.export_file_stem(),
        ctx.today.format("%Y-%m-%d"),
        format.extension()
    ))
}

/// Render and write an export file.
///
/// Creates the parent directory if it does not exist.
///
/// # Errors
///
/// Returns an error if rendering or writing fails.
pub fn write_export<'a>(
    path: &Path,
    format: ExportFormat,
    devices: impl IntoIterator<Item = &'a Device>,
    ctx: &ReportContext,
) -> Result<usize> {
    let devices: Vec<&Device> = devices.into_iter().collect();
    let content = match format {
        ExportFormat::Csv => render_csv(devices.iter().copied(), ctx),
        ExportFormat::Pdf => PdfTable::build(devices.iter().copied(), ctx).to_json()?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::write(path, content)?;

    info!("Exported {} devices to {}", devices.len(), path.display());
    Ok(devices.len())
}
