//! Dashboard counters and chart buckets.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::model::Device;
use crate::status::{classify, latest_next_due, Status};

/// One bar of the status chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartBucket {
    /// Status this bucket counts.
    pub status: Status,
    /// Number of devices with that status.
    pub count: usize,
    /// Share of all devices, 0 to 100.
    pub percentage: f64,
}

/// Everything the dashboard header shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// Number of devices considered.
    pub total: usize,
    /// Tally of classifications. Statuses with no device are absent.
    pub counts_by_status: BTreeMap<Status, usize>,
    /// Devices whose calibration has expired.
    pub overdue_count: usize,
    /// Devices due later this calendar month, today included.
    pub due_soon_this_month_count: usize,
    /// Fixed five-bucket breakdown in chart order.
    pub chart_buckets: Vec<ChartBucket>,
}

impl DashboardStats {
    /// Number of devices with `status`.
    #[must_use]
    pub fn count(&self, status: Status) -> usize {
        self.counts_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Tally classifications over all devices.
#[must_use]
pub fn count_by_status(devices: &[Device], today: NaiveDate) -> BTreeMap<Status, usize> {
    let mut counts = BTreeMap::new();
    for device in devices {
        *counts.entry(classify(device, today)).or_insert(0) += 1;
    }
    counts
}

/// Devices whose latest next-due date is in the current month and year and
/// not before today.
///
/// Unlike the due-soon window, a device due in 10 days but in the next month
/// is not counted here.
#[must_use]
pub fn due_this_month(devices: &[Device], today: NaiveDate) -> usize {
    devices
        .iter()
        .filter_map(latest_next_due)
        .filter(|next| next.year() == today.year() && next.month() == today.month())
        .filter(|next| *next >= today)
        .count()
}

/// Build the dashboard statistics.
#[must_use]
pub fn stats(devices: &[Device], today: NaiveDate) -> DashboardStats {
    let total = devices.len();
    let counts_by_status = count_by_status(devices, today);
    let count = |status: Status| counts_by_status.get(&status).copied().unwrap_or(0);

    let chart_buckets = Status::CHART_ORDER
        .iter()
        .map(|&status| ChartBucket {
            status,
            count: count(status),
            percentage: percentage(count(status), total),
        })
        .collect();
    let overdue_count = count(Status::Overdue);

    DashboardStats {
        total,
        overdue_count,
        due_soon_this_month_count: due_this_month(devices, today),
        chart_buckets,
        counts_by_status,
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
