//! Next-due date computation.
//!
//! A calibration stays valid for a whole number of years. The next-due date is
//! the calibration date with its year advanced by the period; month and day are
//! kept. A Feb 29 calibration whose target year is not a leap year rolls over
//! to Mar 1 of that year.

use chrono::{Datelike, NaiveDate};

/// Compute the next-due date of a calibration.
///
/// Returns `None` when `period_years` is 0 (no further calibration required)
/// or when the target year falls outside the supported calendar range.
#[must_use]
pub fn compute_next_due(calibration_date: NaiveDate, period_years: u32) -> Option<NaiveDate> {
    if period_years == 0 {
        return None;
    }
    let years = i32::try_from(period_years).ok()?;
    let year = calibration_date.year().checked_add(years)?;
    NaiveDate::from_ymd_opt(year, calibration_date.month(), calibration_date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}
