//! Device operations on top of a [`DocumentStore`].
//!
//! Every mutation checks the caller's permissions and validates its input
//! before the store is touched. The device list itself is never edited
//! locally: writes go to the store and the subscription delivers the new
//! snapshot.

use std::sync::Arc;

use chrono::{Datelike, Days, Months, NaiveDate};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::calibration::compute_next_due;
use crate::error::{Error, Result};
use crate::i18n::Locale;
use crate::model::{Calibration, Certificate, Device, NewDevice, User};
use crate::status::sorted_history;
use crate::store::{DocumentStore, Record, DEVICES};

/// Longest accepted calibration period.
pub const MAX_PERIOD_YEARS: u32 = 100;

/// Fields submitted when recording a calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationInput {
    /// Day the calibration was performed.
    pub calibration_date: NaiveDate,
    /// Whole years until the next calibration; 0 when none is required.
    pub period_years: u32,
    /// Optional certificate.
    pub certificate: Option<Certificate>,
}

impl CalibrationInput {
    /// Check the period bound and the certificate format.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an oversized period or a non-PDF certificate.
    pub fn validate(&self) -> Result<()> {
        if self.period_years > MAX_PERIOD_YEARS {
            return Err(Error::validation(
                "period_years",
                format!("must be at most {MAX_PERIOD_YEARS}"),
            ));
        }
        if let Some(certificate) = &self.certificate {
            if !certificate.is_pdf() {
                return Err(Error::validation("certificate", "must be a PDF file"));
            }
        }
        Ok(())
    }
}

/// The next-due preview shown while a calibration is being entered.
#[must_use]
pub fn next_due_preview(calibration_date: NaiveDate, period_years: u32, locale: Locale) -> String {
    compute_next_due(calibration_date, period_years).map_or_else(
        || locale.not_required().to_string(),
        |next| locale.format_date(next),
    )
}

fn require(allowed: bool, action: &'static str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(Error::PermissionDenied { action })
    }
}

/// Device operations for one session.
pub struct DeviceService {
    store: Arc<dyn DocumentStore>,
    snapshot: watch::Receiver<Vec<Record>>,
}

impl std::fmt::Debug for DeviceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceService")
            .field("devices", &self.snapshot.borrow().len())
            .finish_non_exhaustive()
    }
}

impl DeviceService {
    /// Subscribe to the device collection of `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the subscription cannot be established.
    pub async fn open(store: Arc<dyn DocumentStore>) -> Result<Self> {
        let snapshot = store.subscribe(DEVICES).await?;
        debug!("Device subscription open with {} records", snapshot.borrow().len());
        Ok(Self { store, snapshot })
    }

    /// The current device snapshot.
    ///
    /// Records that do not decode as devices are skipped.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        decode_devices(&self.snapshot.borrow())
    }

    /// Wait for the next snapshot and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has shut down.
    pub async fn changed(&mut self) -> Result<Vec<Device>> {
        self.snapshot
            .changed()
            .await
            .map_err(|_| Error::internal("device subscription closed"))?;
        Ok(decode_devices(&self.snapshot.borrow_and_update()))
    }

    /// Look up one device in the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if no device has this id.
    pub fn device(&self, id: &str) -> Result<Device> {
        self.devices()
            .into_iter()
            .find(|device| device.id == id)
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))
    }

    /// A device's calibration history, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if no device has this id.
    pub fn history(&self, id: &str) -> Result<Vec<Calibration>> {
        let device = self.device(id)?;
        Ok(sorted_history(&device).into_iter().cloned().collect())
    }

    /// Register a new device.
    ///
    /// # Errors
    ///
    /// Returns a permission error, [`Error::ValidationFailed`] listing every
    /// bad field, or [`Error::SaveFailed`].
    pub async fn add_device(&self, user: &User, new: NewDevice) -> Result<Device> {
        require(user.permissions().can_add, "add device")?;
        if let Err(err) = new.validate() {
            warn!("Rejected new device: {}", err);
            return Err(err);
        }

        let device = new.into_device(uuid::Uuid::new_v4().to_string())?;
        self.save(&device).await?;
        info!("{} added device {} ({})", user.username, device.name, device.id);
        Ok(device)
    }

    /// Append a calibration to a device's history.
    ///
    /// # Errors
    ///
    /// Returns a permission error, a validation error,
    /// [`Error::DeviceNotFound`] or [`Error::SaveFailed`].
    pub async fn calibrate_device(
        &self,
        user: &User,
        id: &str,
        input: CalibrationInput,
    ) -> Result<Device> {
        require(user.permissions().can_calibrate, "calibrate device")?;
        if let Err(err) = input.validate() {
            warn!("Rejected calibration of {}: {}", id, err);
            return Err(err);
        }

        let mut device = self.device(id)?;
        let calibration = Calibration::new(
            input.calibration_date,
            input.period_years,
            input.certificate,
        );
        device.calibration_history.push(calibration);
        self.save(&device).await?;
        info!(
            "{} calibrated {} on {} for {} years",
            user.username, device.id, input.calibration_date, input.period_years
        );
        Ok(device)
    }

    /// Delete a device.
    ///
    /// # Errors
    ///
    /// Returns a permission error, [`Error::DeviceNotFound`] or
    /// [`Error::DeleteFailed`].
    pub async fn delete_device(&self, user: &User, id: &str) -> Result<()> {
        require(user.permissions().can_delete, "delete device")?;
        let removed = self.store.delete(DEVICES, id).await.map_err(|e| {
            warn!("Deleting device {} failed: {}", id, e);
            Error::DeleteFailed(e.to_string())
        })?;
        if !removed {
            return Err(Error::DeviceNotFound(id.to_string()));
        }
        info!("{} deleted device {}", user.username, id);
        Ok(())
    }

    /// Persist the demo devices.
    ///
    /// # Errors
    ///
    /// Returns a permission error or [`Error::SaveFailed`].
    pub async fn seed_demo_devices(&self, user: &User, today: NaiveDate) -> Result<Vec<Device>> {
        require(user.permissions().can_add, "add device")?;
        let devices = demo_devices(today)?;
        for device in &devices {
            self.save(device).await?;
        }
        info!("{} seeded {} demo devices", user.username, devices.len());
        Ok(devices)
    }

    async fn save(&self, device: &Device) -> Result<()> {
        let record = serde_json::to_value(device)?;
        self.store
            .upsert(DEVICES, &device.id, record)
            .await
            .map_err(|e| {
                warn!("Saving device {} failed: {}", device.id, e);
                Error::SaveFailed(e.to_string())
            })
    }
}

fn decode_devices(records: &[Record]) -> Vec<Device> {
    records
        .iter()
        .filter_map(|record| match serde_json::from_value::<Device>(record.clone()) {
            Ok(device) => Some(device),
            Err(e) => {
                warn!("Skipping malformed device record: {}", e);
                None
            }
        })
        .collect()
}

/// Three demo devices positioned relative to `today`.
///
/// Two are overdue and one is due within the due-soon window.
///
/// # Errors
///
/// Returns an error if `today` is too close to the calendar limits.
pub fn demo_devices(today: NaiveDate) -> Result<Vec<Device>> {
    let out_of_range = || Error::internal("demo dates out of range");

    let multimeter_date = today
        .with_day(15)
        .and_then(|d| d.checked_sub_months(Months::new(18)))
        .ok_or_else(out_of_range)?;
    let scope_date = today
        .checked_add_days(Days::new(20))
        .and_then(|d| d.checked_sub_months(Months::new(12)))
        .ok_or_else(out_of_range)?;
    let caliper_date = today
        .checked_sub_days(Days::new(10))
        .and_then(|d| d.checked_sub_months(Months::new(24)))
        .ok_or_else(out_of_range)?;

    let demo = |name: &str, serial: &str, manufacturer: &str, model: &str, usage: &str, code: &str| {
        NewDevice {
            name: name.to_string(),
            serial_number: serial.to_string(),
            manufacturer: manufacturer.to_string(),
            model: model.to_string(),
            usage: usage.to_string(),
            asset_code: code.to_string(),
            photo: None,
        }
        .into_device(uuid::Uuid::new_v4().to_string())
    };

    let mut multimeter = demo(
        "Digitálny multimeter",
        "SN-001A",
        "Fluke",
        "87V",
        "Laboratórium A",
        "A-12-34-5678",
    )?;
    multimeter
        .calibration_history
        .push(Calibration::new(multimeter_date, 1, None));

    let mut scope = demo(
        "Osciloskop",
        "SN-002B",
        "Tektronix",
        "TBS1052B",
        "Výrobná linka 1",
        "B-23-45-6789",
    )?;
    scope
        .calibration_history
        .push(Calibration::new(scope_date, 1, None));

    let mut caliper = demo(
        "Posuvné meradlo",
        "SN-003C",
        "Mitutoyo",
        "CD-6\" ASX",
        "Kontrola kvality",
        "C-34-56-7890",
    )?;
    caliper
        .calibration_history
        .push(Calibration::new(caliper_date, 2, None));

    Ok(vec![multimeter, scope, caliper])
}
