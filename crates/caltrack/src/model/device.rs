//! Device and calibration records.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calibration::compute_next_due;
use crate::error::{Error, FieldError, Result};

/// Asset code shape: one ASCII letter, then `NN-NN-NNNN` in ASCII digits.
const ASSET_CODE_PATTERN: &str = r"^[a-zA-Z]-[0-9]{2}-[0-9]{2}-[0-9]{4}$";

/// Magic bytes every accepted certificate starts with.
const PDF_MAGIC: &[u8] = b"%PDF";

fn asset_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(ASSET_CODE_PATTERN).expect("Invalid asset code pattern"))
}

/// Check an asset code against the `<Letter>-NN-NN-NNNN` pattern.
#[must_use]
pub fn is_valid_asset_code(code: &str) -> bool {
    asset_code_regex().is_match(code)
}

/// A measuring device as held by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Opaque document id.
    pub id: String,
    /// Device name.
    pub name: String,
    /// Manufacturer serial number.
    pub serial_number: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model designation.
    pub model: String,
    /// Where or how the device is used.
    pub usage: String,
    /// Structured asset code, always upper-case once persisted.
    pub asset_code: String,
    /// Reference to a photo of the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Calibration events in no meaningful order.
    #[serde(default)]
    pub calibration_history: Vec<Calibration>,
}

/// A single calibration event.
///
/// The next-due date is never stored independently: it is derived from the
/// calibration date and period on construction and on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CalibrationRecord", into = "CalibrationRecord")]
pub struct Calibration {
    calibration_date: NaiveDate,
    period_years: u32,
    next_due: Option<NaiveDate>,
    certificate: Option<Certificate>,
}

impl Calibration {
    /// Create a calibration, deriving its next-due date.
    #[must_use]
    pub fn new(
        calibration_date: NaiveDate,
        period_years: u32,
        certificate: Option<Certificate>,
    ) -> Self {
        Self {
            calibration_date,
            period_years,
            next_due: compute_next_due(calibration_date, period_years),
            certificate,
        }
    }

    /// The day the device was calibrated.
    #[must_use]
    pub fn calibration_date(&self) -> NaiveDate {
        self.calibration_date
    }

    /// Whole years until recalibration; 0 means never.
    #[must_use]
    pub fn period_years(&self) -> u32 {
        self.period_years
    }

    /// The derived next-due date, absent when the period is 0.
    #[must_use]
    pub fn next_due(&self) -> Option<NaiveDate> {
        self.next_due
    }

    /// The attached certificate, if any.
    #[must_use]
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }
}

/// Persisted shape of a calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalibrationRecord {
    calibration_date: NaiveDate,
    calibration_period_in_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_calibration_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    certificate: Option<Certificate>,
}

impl From<CalibrationRecord> for Calibration {
    fn from(record: CalibrationRecord) -> Self {
        // Whatever next date was stored is discarded and recomputed.
        Self::new(
            record.calibration_date,
            record.calibration_period_in_years,
            record.certificate,
        )
    }
}

impl From<Calibration> for CalibrationRecord {
    fn from(calibration: Calibration) -> Self {
        Self {
            calibration_date: calibration.calibration_date,
            calibration_period_in_years: calibration.period_years,
            next_calibration_date: calibration.next_due,
            certificate: calibration.certificate,
        }
    }
}

/// A calibration certificate attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Original file name, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Raw PDF bytes, base64 encoded in the store.
    #[serde(serialize_with = "encode_base64", deserialize_with = "decode_base64")]
    pub content: Vec<u8>,
}

impl Certificate {
    /// Create a certificate attachment.
    #[must_use]
    pub fn new(content: Vec<u8>, file_name: Option<String>) -> Self {
        Self { file_name, content }
    }

    /// Check whether the content carries the PDF signature.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.content.starts_with(PDF_MAGIC)
    }
}

fn encode_base64<S: Serializer>(
    bytes: &[u8],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn decode_base64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(serde::de::Error::custom)
}

/// Fields submitted when registering a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDevice {
    /// Device name.
    pub name: String,
    /// Manufacturer serial number.
    pub serial_number: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model designation.
    pub model: String,
    /// Where or how the device is used.
    pub usage: String,
    /// Asset code in any letter case.
    pub asset_code: String,
    /// Optional photo reference.
    pub photo: Option<String>,
}

impl NewDevice {
    /// Validate every field, reporting all failures at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationFailed`] listing each missing or malformed field.
    pub fn validate(&self) -> Result<()> {
        let mut failures = Vec::new();
        let required = [
            ("name", &self.name),
            ("serial_number", &self.serial_number),
            ("manufacturer", &self.manufacturer),
            ("model", &self.model),
            ("usage", &self.usage),
            ("asset_code", &self.asset_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                failures.push(FieldError::new(field, "is required"));
            }
        }
        if !self.asset_code.trim().is_empty() && !is_valid_asset_code(&self.asset_code) {
            failures.push(FieldError::new(
                "asset_code",
                "must have the form L-NN-NN-NNNN (e.g. E-02-01-3002)",
            ));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed(failures))
        }
    }

    /// Turn validated fields into a device with an empty history.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is invalid.
    pub fn into_device(self, id: String) -> Result<Device> {
        self.validate()?;
        Ok(Device {
            id,
            name: self.name,
            serial_number: self.serial_number,
            manufacturer: self.manufacturer,
            model: self.model,
            usage: self.usage,
            asset_code: self.asset_code.to_uppercase(),
            photo: self.photo,
            calibration_history: Vec::new(),
        })
    }
}
