//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::i18n::Locale;
use crate::model::{NewDevice, Role};
use crate::view::{Choice, SortConfig, SortDirection, SortKey, ViewQuery};

/// Credentials for commands that change data.
#[derive(Debug, Clone, Args)]
pub struct Credentials {
    /// Email, or a bare login name for `<name>@demo.com`
    #[arg(long, env = "CALTRACK_EMAIL")]
    pub email: String,

    /// Password
    #[arg(long, env = "CALTRACK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// User account commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Register a new account
    Register {
        /// Email address
        #[arg(long)]
        email: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Display name
        #[arg(long)]
        username: String,

        /// Role of the new account
        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,
    },

    /// Check credentials and show the account
    Login(Credentials),
}

/// Device commands.
#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Register a new device
    Add(AddCommand),

    /// Record a calibration
    Calibrate(CalibrateCommand),

    /// Delete a device
    Delete {
        /// Device id
        id: String,

        /// Credentials of the acting user.
        #[command(flatten)]
        credentials: Credentials,
    },

    /// List devices
    List(ListCommand),

    /// Show a device's calibration history
    History {
        /// Device id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List the manufacturers and usages available as filters
    Filters {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Save the latest calibration certificate to a file
    Certificate {
        /// Device id
        id: String,

        /// Target file (defaults to the certificate's name in the export directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Device name
    #[arg(long)]
    pub name: String,

    /// Serial number
    #[arg(long)]
    pub serial: String,

    /// Manufacturer
    #[arg(long)]
    pub manufacturer: String,

    /// Model
    #[arg(long)]
    pub model: String,

    /// Usage or location
    #[arg(long)]
    pub usage: String,

    /// Asset code, e.g. E-02-01-3002
    #[arg(long)]
    pub asset_code: String,

    /// Photo reference
    #[arg(long)]
    pub photo: Option<String>,

    /// Credentials of the acting user.
    #[command(flatten)]
    pub credentials: Credentials,
}

impl AddCommand {
    /// The submitted device fields.
    #[must_use]
    pub fn new_device(&self) -> NewDevice {
        NewDevice {
            name: self.name.clone(),
            serial_number: self.serial.clone(),
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            usage: self.usage.clone(),
            asset_code: self.asset_code.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// Calibrate command arguments.
#[derive(Debug, Args)]
pub struct CalibrateCommand {
    /// Device id
    pub id: String,

    /// Calibration date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Years until the next calibration, 0 if none is required
    #[arg(long)]
    pub period: u32,

    /// PDF certificate to attach
    #[arg(long, value_name = "FILE")]
    pub certificate: Option<PathBuf>,

    /// Credentials of the acting user.
    #[command(flatten)]
    pub credentials: Credentials,
}

/// Filter and sort flags shared by listing commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive search over name, serial, manufacturer, model, usage and asset code
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Only this manufacturer ("all" for every one)
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Only this usage ("all" for every one)
    #[arg(long)]
    pub usage: Option<String>,

    /// Sort column
    #[arg(long, value_enum, default_value = "name")]
    pub sort: SortArg,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

impl FilterArgs {
    /// The view query these flags describe, ordering names for `locale`.
    #[must_use]
    pub fn to_query(&self, locale: Locale) -> ViewQuery {
        let choice = |value: &Option<String>| value.as_deref().map_or(Choice::All, Choice::parse);
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        ViewQuery {
            search: self.search.clone(),
            manufacturer: choice(&self.manufacturer),
            usage: choice(&self.usage),
            sort: SortConfig::new(self.sort.into(), direction),
            locale,
        }
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Filter and sort flags.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Filter and sort flags.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export commands.
#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Export displayed devices as CSV
    Csv(ExportArgs),

    /// Export displayed devices as a table for the PDF renderer
    Pdf(ExportArgs),
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Filter and sort flags.
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Target file (defaults to a dated name in the export directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Role argument for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    /// Full access
    Admin,
    /// May record calibrations
    Moderator,
    /// Read-only access
    User,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Self::Admin,
            RoleArg::Moderator => Self::Moderator,
            RoleArg::User => Self::User,
        }
    }
}

/// Sort column argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortArg {
    /// Device name
    #[default]
    Name,
    /// Next calibration date
    NextDue,
    /// Status precedence
    Status,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => Self::Name,
            SortArg::NextDue => Self::NextCalibrationDate,
            SortArg::Status => Self::Status,
        }
    }
}
