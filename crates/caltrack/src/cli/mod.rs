//! Command-line interface for caltrack.
//!
//! This module provides the CLI structure for the `caltrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, CalibrateCommand, ConfigCommand, Credentials, DashboardCommand, DeviceCommand,
    ExportArgs, ExportCommand, FilterArgs, ListCommand, RoleArg, SortArg, UserCommand,
};

/// caltrack - Track measuring device calibrations
///
/// Keeps a register of measuring devices and their calibration history,
/// classifies each device as valid, due soon, overdue, uncalibrated or
/// calibration free, and exports the register as CSV or a PDF table.
#[derive(Debug, Parser)]
#[command(name = "caltrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register accounts and check credentials
    #[command(subcommand)]
    User(UserCommand),

    /// Manage devices and calibrations
    #[command(subcommand)]
    Device(DeviceCommand),

    /// Show status counts and the chart breakdown
    Dashboard(DashboardCommand),

    /// Export the device register
    #[command(subcommand)]
    Export(ExportCommand),

    /// Insert the demo devices
    Seed(Credentials),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "caltrack");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["caltrack", "-q", "dashboard"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["caltrack", "dashboard"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["caltrack", "-v", "dashboard"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["caltrack", "-vv", "dashboard"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["caltrack", "-c", "/custom/config.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert!(matches!(cli.command, Command::Config(ConfigCommand::Path)));
    }

    #[test]
    fn test_parse_device_add() {
        let cli = parse(&[
            "caltrack",
            "device",
            "add",
            "--name",
            "Multimeter",
            "--serial",
            "SN-1",
            "--manufacturer",
            "Fluke",
            "--model",
            "87V",
            "--usage",
            "Lab",
            "--asset-code",
            "e-02-01-3002",
            "--email",
            "admin",
            "--password",
            "secret1",
        ]);
        let Command::Device(DeviceCommand::Add(add)) = cli.command else {
            panic!("expected device add");
        };
        assert_eq!(add.credentials.email, "admin");
        let new = add.new_device();
        assert_eq!(new.asset_code, "e-02-01-3002");
        assert!(new.photo.is_none());
    }

    #[test]
    fn test_parse_device_calibrate() {
        let cli = parse(&[
            "caltrack",
            "device",
            "calibrate",
            "abc",
            "--date",
            "2023-01-15",
            "--period",
            "2",
            "--email",
            "a@b.c",
            "--password",
            "x",
        ]);
        let Command::Device(DeviceCommand::Calibrate(cal)) = cli.command else {
            panic!("expected device calibrate");
        };
        assert_eq!(cal.id, "abc");
        assert_eq!(cal.date, chrono::NaiveDate::from_ymd_opt(2023, 1, 15).unwrap());
        assert_eq!(cal.period, 2);
        assert!(cal.certificate.is_none());
    }

    #[test]
    fn test_parse_calibrate_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "caltrack",
            "device",
            "calibrate",
            "abc",
            "--date",
            "15.01.2023",
            "--period",
            "1",
            "--email",
            "a",
            "--password",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = parse(&[
            "caltrack",
            "device",
            "list",
            "--search",
            "scope",
            "--sort",
            "next-due",
            "--desc",
            "--json",
        ]);
        let Command::Device(DeviceCommand::List(list)) = cli.command else {
            panic!("expected device list");
        };
        assert!(list.json);
        assert_eq!(list.filter.search, "scope");
        assert_eq!(list.filter.sort, SortArg::NextDue);
        assert!(list.filter.desc);
    }

    #[test]
    fn test_parse_device_filters() {
        let cli = parse(&["caltrack", "device", "filters", "--json"]);
        assert!(matches!(
            cli.command,
            Command::Device(DeviceCommand::Filters { json: true })
        ));
    }

    #[test]
    fn test_parse_export_pdf() {
        let cli = parse(&["caltrack", "export", "pdf", "-o", "out.json"]);
        let Command::Export(ExportCommand::Pdf(args)) = cli.command else {
            panic!("expected export pdf");
        };
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_parse_user_register_default_role() {
        let cli = parse(&[
            "caltrack",
            "user",
            "register",
            "--email",
            "a@demo.com",
            "--password",
            "secret1",
            "--username",
            "A",
        ]);
        assert!(matches!(
            cli.command,
            Command::User(UserCommand::Register {
                role: RoleArg::User,
                ..
            })
        ));
    }
}
