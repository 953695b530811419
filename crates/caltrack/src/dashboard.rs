//! The derived dashboard: displayed devices plus statistics.
//!
//! Nothing here is stored. [`Dashboard::compute`] is called again whenever the
//! device snapshot, the filters or the sort change; [`DashboardState`] does
//! that bookkeeping for callers that hold the inputs in one place.

use chrono::NaiveDate;

use crate::i18n::Locale;
use crate::model::Device;
use crate::stats::{stats, DashboardStats};
use crate::view::{view, Choice, SortKey, ViewQuery};

/// One recomputation of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<'a> {
    /// Filtered and sorted devices.
    pub displayed: Vec<&'a Device>,
    /// Statistics over every device, ignoring filters.
    pub stats: DashboardStats,
}

impl<'a> Dashboard<'a> {
    /// Derive the dashboard from its inputs.
    #[must_use]
    pub fn compute(devices: &'a [Device], query: &ViewQuery, today: NaiveDate) -> Self {
        Self {
            displayed: view(devices, query, today),
            stats: stats(devices, today),
        }
    }
}

/// Dashboard inputs with a dirty flag.
///
/// Every setter marks the state dirty; [`DashboardState::take_dirty`] tells
/// the caller whether a recompute is due.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    devices: Vec<Device>,
    query: ViewQuery,
    dirty: bool,
}

impl DashboardState {
    /// Create state over an initial snapshot.
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices,
            query: ViewQuery::default(),
            dirty: true,
        }
    }

    /// Replace the device snapshot.
    pub fn set_devices(&mut self, devices: Vec<Device>) {
        self.devices = devices;
        self.dirty = true;
    }

    /// Set the free-text search term.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
        self.dirty = true;
    }

    /// Set the manufacturer filter.
    pub fn set_manufacturer(&mut self, choice: Choice) {
        self.query.manufacturer = choice;
        self.dirty = true;
    }

    /// Set the usage filter.
    pub fn set_usage(&mut self, choice: Choice) {
        self.query.usage = choice;
        self.dirty = true;
    }

    /// Set the alphabet used to order names.
    pub fn set_locale(&mut self, locale: Locale) {
        self.query.locale = locale;
        self.dirty = true;
    }

    /// Select a sort column, toggling direction if it is already active.
    pub fn select_sort(&mut self, key: SortKey) {
        self.query.sort = self.query.sort.toggle(key);
        self.dirty = true;
    }

    /// Current device snapshot.
    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Current query.
    #[must_use]
    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Report and clear the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Recompute the dashboard from the current inputs.
    #[must_use]
    pub fn compute(&self, today: NaiveDate) -> Dashboard<'_> {
        Dashboard::compute(&self.devices, &self.query, today)
    }
}
