//! Flat export rows.
//!
//! Rows are format agnostic: the CSV writer and the PDF table both consume
//! them. The PDF variant strips accents from every cell because the renderer's
//! built-in font cannot draw them.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;

use crate::i18n::Locale;
use crate::model::{Calibration, Device};
use crate::status::{classify, latest_calibration, sorted_history};
use crate::text::strip_diacritics;

/// Default cell text for a missing date.
pub const DEFAULT_PLACEHOLDER: &str = "N/A";

/// Inputs every projection needs besides the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    /// Reference day for status classification.
    pub today: NaiveDate,
    /// Locale for labels and dates.
    pub locale: Locale,
    /// Text shown where a date is absent.
    pub placeholder: String,
}

impl ReportContext {
    /// Create a context with the default placeholder.
    #[must_use]
    pub fn new(today: NaiveDate, locale: Locale) -> Self {
        Self {
            today,
            locale,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Replace the placeholder text.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    fn format_date(&self, date: Option<NaiveDate>) -> String {
        date.map_or_else(
            || self.placeholder.clone(),
            |date| self.locale.format_date(date),
        )
    }
}

/// One device as a row of text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Device name.
    pub name: String,
    /// Serial number.
    pub serial_number: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model.
    pub model: String,
    /// Usage.
    pub usage: String,
    /// Asset code.
    pub asset_code: String,
    /// Localized status label.
    pub status: String,
    /// Latest calibration date, or the placeholder.
    pub calibration_date: String,
    /// Latest next-due date, or the placeholder.
    pub next_due: String,
}

impl ReportRow {
    /// Project a device into a row.
    #[must_use]
    pub fn project(device: &Device, ctx: &ReportContext) -> Self {
        let latest = latest_calibration(device);
        Self {
            name: device.name.clone(),
            serial_number: device.serial_number.clone(),
            manufacturer: device.manufacturer.clone(),
            model: device.model.clone(),
            usage: device.usage.clone(),
            asset_code: device.asset_code.clone(),
            status: ctx
                .locale
                .status_label(classify(device, ctx.today))
                .to_string(),
            calibration_date: ctx.format_date(latest.map(Calibration::calibration_date)),
            next_due: ctx.format_date(latest.and_then(Calibration::next_due)),
        }
    }

    /// Project a device into a row safe for the PDF renderer.
    #[must_use]
    pub fn project_for_pdf(device: &Device, ctx: &ReportContext) -> Self {
        Self::project(device, ctx).strip_diacritics()
    }

    /// The same row with accents removed from every cell.
    #[must_use]
    pub fn strip_diacritics(self) -> Self {
        Self {
            name: strip_diacritics(&self.name),
            serial_number: strip_diacritics(&self.serial_number),
            manufacturer: strip_diacritics(&self.manufacturer),
            model: strip_diacritics(&self.model),
            usage: strip_diacritics(&self.usage),
            asset_code: strip_diacritics(&self.asset_code),
            status: strip_diacritics(&self.status),
            calibration_date: strip_diacritics(&self.calibration_date),
            next_due: strip_diacritics(&self.next_due),
        }
    }

    /// Cells in header order.
    #[must_use]
    pub fn cells(&self) -> [&str; 9] {
        [
            &self.name,
            &self.serial_number,
            &self.manufacturer,
            &self.model,
            &self.usage,
            &self.asset_code,
            &self.status,
            &self.calibration_date,
            &self.next_due,
        ]
    }
}

/// One calibration event as a row of text cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    /// Calibration date.
    pub calibration_date: String,
    /// Next-due date, or the placeholder.
    pub next_due: String,
    /// Period text.
    pub period: String,
    /// Certificate file name, empty when no certificate is attached.
    pub certificate: String,
}

impl HistoryRow {
    /// Cells in header order.
    #[must_use]
    pub fn cells(&self) -> [&str; 4] {
        [
            &self.calibration_date,
            &self.next_due,
            &self.period,
            &self.certificate,
        ]
    }
}

/// A device's calibration history, newest first.
#[must_use]
pub fn history_rows(device: &Device, ctx: &ReportContext) -> Vec<HistoryRow> {
    sorted_history(device)
        .into_iter()
        .map(|cal| HistoryRow {
            calibration_date: ctx.locale.format_date(cal.calibration_date()),
            next_due: ctx.format_date(cal.next_due()),
            period: ctx.locale.period_text(cal.period_years()),
            certificate: history_certificate_file_name(device, cal).unwrap_or_default(),
        })
        .collect()
}

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s/\\]+").expect("Invalid separator pattern"))
}

/// Collapse whitespace and path separators into `_` and break up `..`.
fn file_name_part(text: &str) -> String {
    let mut part = separator_regex().replace_all(text, "_").into_owned();
    while part.contains("..") {
        part = part.replace("..", "_");
    }
    part
}

fn file_name_stem(device: &Device) -> String {
    format!(
        "Certificate_{}_{}",
        file_name_part(&device.name),
        file_name_part(&device.serial_number)
    )
}

/// Last path component of a stored certificate name.
///
/// Both `/` and `\` count as separators. `None` when nothing usable is left.
fn stored_file_name(stored: &str) -> Option<String> {
    let last = stored.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last.chars().all(|c| c == '.') {
        return None;
    }
    Some(last.to_string())
}

/// File name of the latest calibration's certificate.
///
/// Returns `None` when the latest calibration has no certificate. A stored
/// name is reduced to its last path component. A missing one becomes
/// `Certificate_<name>_<serial>.pdf`, with whitespace and path separators in
/// the name and serial replaced by `_`. The result never leaves the
/// directory it is joined onto.
#[must_use]
pub fn certificate_file_name(device: &Device) -> Option<String> {
    let certificate = latest_calibration(device)?.certificate()?;
    Some(
        certificate
            .file_name
            .as_deref()
            .and_then(stored_file_name)
            .unwrap_or_else(|| format!("{}.pdf", file_name_stem(device))),
    )
}

/// File name of a historical calibration's certificate.
///
/// Like [`certificate_file_name`], with the calibration year appended to the
/// synthesized name.
#[must_use]
pub fn history_certificate_file_name(device: &Device, calibration: &Calibration) -> Option<String> {
    let certificate = calibration.certificate()?;
    Some(
        certificate
            .file_name
            .as_deref()
            .and_then(stored_file_name)
            .unwrap_or_else(|| {
                format!(
                    "{}_{}.pdf",
                    file_name_stem(device),
                    calibration.calibration_date().year()
                )
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Certificate;
    use crate::status::tests::{date, device_with};

    fn ctx() -> ReportContext {
        ReportContext::new(date(2024, 1, 10), Locale::En)
    }

    fn pdf() -> Option<Certificate> {
        Some(Certificate::new(b"%PDF-1.7".to_vec(), None))
    }

    #[test]
    fn test_project_calibrated_device() {
        let mut device = device_with("Meter", vec![Calibration::new(date(2023, 1, 15), 1, None)]);
        device.asset_code = "E-02-01-3002".to_string();
        let row = ReportRow::project(&device, &ctx());
        assert_eq!(row.name, "Meter");
        assert_eq!(row.asset_code, "E-02-01-3002");
        assert_eq!(row.status, "Due soon");
        assert_eq!(row.calibration_date, "15.01.2023");
        assert_eq!(row.next_due, "15.01.2024");
    }

    #[test]
    fn test_project_uncalibrated_uses_placeholder() {
        let device = device_with("Meter", Vec::new());
        let row = ReportRow::project(&device, &ctx());
        assert_eq!(row.status, "Uncalibrated");
        assert_eq!(row.calibration_date, "N/A");
        assert_eq!(row.next_due, "N/A");

        let row = ReportRow::project(&device, &ctx().with_placeholder("-"));
        assert_eq!(row.next_due, "-");
    }

    #[test]
    fn test_project_free_has_date_but_no_next_due() {
        let device = device_with("Meter", vec![Calibration::new(date(2020, 3, 1), 0, None)]);
        let row = ReportRow::project(&device, &ctx());
        assert_eq!(row.status, "Calibration not required");
        assert_eq!(row.calibration_date, "01.03.2020");
        assert_eq!(row.next_due, "N/A");
    }

    #[test]
    fn test_pdf_row_strips_every_field() {
        let mut device = device_with("Posuvné meradlo", Vec::new());
        device.manufacturer = "Müller".to_string();
        device.usage = "Laboratórium A".to_string();
        device.model = "Škoda".to_string();
        let ctx = ReportContext::new(date(2024, 1, 10), Locale::Sk);
        let row = ReportRow::project_for_pdf(&device, &ctx);
        assert_eq!(row.name, "Posuvne meradlo");
        assert_eq!(row.manufacturer, "Muller");
        assert_eq!(row.usage, "Laboratorium A");
        assert_eq!(row.model, "Skoda");
        assert_eq!(row.status, "Nekalibrovane");
        assert!(row.cells().iter().all(|cell| cell.is_ascii()));
    }

    #[test]
    fn test_certificate_file_name_defaults() {
        let mut device = device_with("x", vec![Calibration::new(date(2023, 1, 1), 1, pdf())]);
        device.name = "Digital  multi meter".to_string();
        device.serial_number = "SN-001A".to_string();
        assert_eq!(
            certificate_file_name(&device).as_deref(),
            Some("Certificate_Digital_multi_meter_SN-001A.pdf")
        );
    }

    #[test]
    fn test_certificate_file_name_prefers_stored_name() {
        let cert = Certificate::new(b"%PDF".to_vec(), Some("report-2023.pdf".to_string()));
        let device = device_with("x", vec![Calibration::new(date(2023, 1, 1), 1, Some(cert))]);
        assert_eq!(
            certificate_file_name(&device).as_deref(),
            Some("report-2023.pdf")
        );
    }

    #[test]
    fn test_certificate_file_name_stays_in_directory() {
        let mut device = device_with("x", vec![Calibration::new(date(2023, 1, 1), 1, pdf())]);
        device.name = "../../etc/cron.d/Meter".to_string();
        device.serial_number = "..\\..\\SN".to_string();
        let name = certificate_file_name(&device).unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains('\\'));
        assert!(!name.contains(".."));
        assert!(name.starts_with("Certificate_"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(std::path::Path::new(&name).components().count(), 1);
    }

    #[test]
    fn test_certificate_file_name_keeps_last_stored_component() {
        let cert = |name: &str| Certificate::new(b"%PDF".to_vec(), Some(name.to_string()));
        let device = device_with(
            "x",
            vec![Calibration::new(date(2023, 1, 1), 1, Some(cert("/etc/cron.d/evil.pdf")))],
        );
        assert_eq!(certificate_file_name(&device).as_deref(), Some("evil.pdf"));

        let device = device_with(
            "x",
            vec![Calibration::new(date(2023, 1, 1), 1, Some(cert("C:\\temp\\evil.pdf")))],
        );
        assert_eq!(certificate_file_name(&device).as_deref(), Some("evil.pdf"));

        let mut device = device_with(
            "Meter",
            vec![Calibration::new(date(2023, 1, 1), 1, Some(cert("../..")))],
        );
        device.serial_number = "SN1".to_string();
        assert_eq!(
            certificate_file_name(&device).as_deref(),
            Some("Certificate_Meter_SN1.pdf")
        );
    }

    #[test]
    fn test_history_certificate_file_name_stays_in_directory() {
        let calibration = Calibration::new(date(2022, 6, 1), 1, pdf());
        let mut device = device_with("x", vec![calibration.clone()]);
        device.name = "/abs/path".to_string();
        device.serial_number = "../SN".to_string();
        assert_eq!(
            history_certificate_file_name(&device, &calibration).as_deref(),
            Some("Certificate__abs_path___SN_2022.pdf")
        );

        let stored = Calibration::new(
            date(2022, 6, 1),
            1,
            Some(Certificate::new(b"%PDF".to_vec(), Some("../../x.pdf".to_string()))),
        );
        assert_eq!(
            history_certificate_file_name(&device, &stored).as_deref(),
            Some("x.pdf")
        );
    }

    #[test]
    fn test_certificate_file_name_none_without_certificate() {
        let device = device_with(
            "x",
            vec![
                Calibration::new(date(2022, 1, 1), 1, pdf()),
                Calibration::new(date(2023, 1, 1), 1, None),
            ],
        );
        // Only the latest calibration counts.
        assert_eq!(certificate_file_name(&device), None);
    }

    #[test]
    fn test_history_rows_newest_first_with_year_in_name() {
        let mut device = device_with(
            "x",
            vec![
                Calibration::new(date(2021, 5, 1), 2, pdf()),
                Calibration::new(date(2023, 5, 1), 0, None),
            ],
        );
        device.name = "Scope".to_string();
        device.serial_number = "S9".to_string();
        let rows = history_rows(&device, &ctx());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].calibration_date, "01.05.2023");
        assert_eq!(rows[0].next_due, "N/A");
        assert_eq!(rows[0].period, "Calibration free");
        assert_eq!(rows[0].certificate, "");
        assert_eq!(rows[1].next_due, "01.05.2023");
        assert_eq!(rows[1].period, "2 years");
        assert_eq!(rows[1].certificate, "Certificate_Scope_S9_2021.pdf");
    }
}
