//! Filtering and sorting of device collections.
//!
//! [`view`] is a pure function of its inputs: it borrows the device snapshot,
//! never reorders it in place, and returns the displayed sequence. Callers
//! recompute it whenever the snapshot, the filters or the sort change.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::i18n::Locale;
use crate::model::Device;
use crate::status::{classify, latest_next_due};
use crate::text::{collate, contains_ignore_case};

/// Wildcard accepted by [`Choice::parse`].
pub const ALL: &str = "all";

/// A categorical filter: everything, or one exact value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    /// No restriction.
    #[default]
    All,
    /// Only devices whose field equals this value.
    Exact(String),
}

impl Choice {
    /// Build a choice from a select value; `"all"` is the wildcard.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            Self::All
        } else {
            Self::Exact(value.to_string())
        }
    }

    /// Check a field value against this choice.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(expected) => expected == value,
        }
    }
}

/// Column a device list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Device name, collated by the query's locale.
    #[default]
    Name,
    /// Next-due date of the latest calibration; absent dates sort last.
    NextCalibrationDate,
    /// Status rank.
    Status,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// The active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    /// Column.
    pub key: SortKey,
    /// Direction.
    pub direction: SortDirection,
}

impl SortConfig {
    /// Create a sort configuration.
    #[must_use]
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// The configuration after the user selects `key`.
    ///
    /// Selecting the active key flips the direction; any other key starts
    /// ascending.
    #[must_use]
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Asc)
        }
    }
}

/// Every input of the displayed device list besides the devices themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Free text matched against the descriptive fields.
    pub search: String,
    /// Manufacturer filter.
    pub manufacturer: Choice,
    /// Usage filter.
    pub usage: Choice,
    /// Active sort.
    pub sort: SortConfig,
    /// Alphabet used to order names.
    #[serde(default)]
    pub locale: Locale,
}

impl ViewQuery {
    /// Check whether a device passes every filter.
    #[must_use]
    pub fn matches(&self, device: &Device) -> bool {
        self.manufacturer.accepts(&device.manufacturer)
            && self.usage.accepts(&device.usage)
            && matches_search(device, &self.search.to_lowercase())
    }
}

fn matches_search(device: &Device, term: &str) -> bool {
    [
        device.name.as_str(),
        device.serial_number.as_str(),
        device.manufacturer.as_str(),
        device.model.as_str(),
        device.usage.as_str(),
        device.asset_code.as_str(),
    ]
    .iter()
    .any(|field| contains_ignore_case(field, term))
}

/// Precomputed sort value of one device.
enum SortValue<'a> {
    Name(&'a str),
    // `None` sorts after every date.
    Next(Option<NaiveDate>),
    Rank(u8),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self, locale: Locale) -> Ordering {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => collate(a, b, locale),
            (Self::Next(a), Self::Next(b)) => match (a, b) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            (Self::Rank(a), Self::Rank(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn sort_value(device: &Device, key: SortKey, today: NaiveDate) -> SortValue<'_> {
    match key {
        SortKey::Name => SortValue::Name(&device.name),
        SortKey::NextCalibrationDate => SortValue::Next(latest_next_due(device)),
        SortKey::Status => SortValue::Rank(classify(device, today).rank()),
    }
}

/// Filter and sort devices for display.
///
/// The sort is stable: devices that compare equal keep their snapshot order in
/// both directions.
#[must_use]
pub fn view<'a>(devices: &'a [Device], query: &ViewQuery, today: NaiveDate) -> Vec<&'a Device> {
    let mut keyed: Vec<(SortValue<'a>, &'a Device)> = devices
        .iter()
        .filter(|device| query.matches(device))
        .map(|device| (sort_value(device, query.sort.key, today), device))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match query.sort.direction {
        SortDirection::Asc => a.compare(b, query.locale),
        SortDirection::Desc => b.compare(a, query.locale),
    });

    keyed.into_iter().map(|(_, device)| device).collect()
}

/// Distinct non-empty manufacturers, sorted.
#[must_use]
pub fn unique_manufacturers(devices: &[Device]) -> Vec<String> {
    distinct(devices.iter().map(|d| d.manufacturer.as_str()))
}

/// Distinct non-empty usages, sorted.
#[must_use]
pub fn unique_usages(devices: &[Device]) -> Vec<String> {
    distinct(devices.iter().map(|d| d.usage.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
