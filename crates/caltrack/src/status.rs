//! Device status classification.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Calibration, Device};

/// Devices due within this many days (inclusive) are due soon.
pub const DUE_SOON_WINDOW_DAYS: u64 = 30;

/// Calibration status of a device.
///
/// Variants are declared in sort rank order, so the derived `Ord` is the
/// dashboard precedence: overdue first, calibration-free last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Next-due date has passed.
    Overdue,
    /// Next-due date is within the due-soon window.
    DueSoon,
    /// No calibration recorded.
    Uncalibrated,
    /// Calibration is current.
    Valid,
    /// Latest calibration has a zero period.
    CalibrationFree,
}

impl Status {
    /// Every status in chart order.
    pub const CHART_ORDER: [Status; 5] = [
        Status::Valid,
        Status::DueSoon,
        Status::Overdue,
        Status::Uncalibrated,
        Status::CalibrationFree,
    ];

    /// Sort rank, 1 (overdue) through 5 (calibration-free).
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Overdue => 1,
            Self::DueSoon => 2,
            Self::Uncalibrated => 3,
            Self::Valid => 4,
            Self::CalibrationFree => 5,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overdue => write!(f, "overdue"),
            Self::DueSoon => write!(f, "due-soon"),
            Self::Uncalibrated => write!(f, "uncalibrated"),
            Self::Valid => write!(f, "valid"),
            Self::CalibrationFree => write!(f, "calibration-free"),
        }
    }
}

/// The most recent calibration of a device.
///
/// When several records share the latest date the one listed first wins.
#[must_use]
pub fn latest_calibration(device: &Device) -> Option<&Calibration> {
    device
        .calibration_history
        .iter()
        .fold(None, |latest: Option<&Calibration>, cal| match latest {
            Some(best) if cal.calibration_date() <= best.calibration_date() => Some(best),
            _ => Some(cal),
        })
}

/// Calibration history sorted newest first. Ties keep their stored order.
#[must_use]
pub fn sorted_history(device: &Device) -> Vec<&Calibration> {
    let mut history: Vec<&Calibration> = device.calibration_history.iter().collect();
    history.sort_by(|a, b| b.calibration_date().cmp(&a.calibration_date()));
    history
}

/// Next-due date of the latest calibration, if any.
#[must_use]
pub fn latest_next_due(device: &Device) -> Option<NaiveDate> {
    latest_calibration(device).and_then(Calibration::next_due)
}

/// Classify a device relative to `today`.
#[must_use]
pub fn classify(device: &Device, today: NaiveDate) -> Status {
    let Some(latest) = latest_calibration(device) else {
        return Status::Uncalibrated;
    };
    if latest.period_years() == 0 {
        return Status::CalibrationFree;
    }
    let Some(next) = latest.next_due() else {
        return Status::Valid;
    };

    if next < today {
        return Status::Overdue;
    }
    match today.checked_add_days(Days::new(DUE_SOON_WINDOW_DAYS)) {
        Some(window_end) if next <= window_end => Status::DueSoon,
        Some(_) => Status::Valid,
        // Window end past the calendar range: everything not overdue is inside it.
        None => Status::DueSoon,
    }
}
