//! `caltrack` - Calibration register for measuring devices
//!
//! This library keeps devices and their calibration history, derives each
//! device's calibration status, builds the filtered and sorted dashboard with
//! its statistics, and projects devices into export rows.
//!
//! The calculation modules ([`calibration`], [`status`], [`view`], [`stats`],
//! [`dashboard`], [`report`]) are pure: they take `today` and a locale as
//! explicit inputs and hold no state. Persistence and authentication sit behind
//! the [`store::DocumentStore`] and [`auth::AuthProvider`] traits.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod i18n;
pub mod logging;
pub mod model;
pub mod report;
pub mod service;
pub mod stats;
pub mod status;
pub mod store;
pub mod text;
pub mod view;

pub use calibration::compute_next_due;
pub use config::Config;
pub use dashboard::{Dashboard, DashboardState};
pub use error::{AuthError, Error, Result};
pub use i18n::Locale;
pub use logging::init_logging;
pub use model::{Calibration, Certificate, Device, NewDevice, Permissions, Role, User};
pub use service::DeviceService;
pub use stats::DashboardStats;
pub use status::{classify, Status};
pub use view::{SortConfig, SortDirection, SortKey, ViewQuery};
