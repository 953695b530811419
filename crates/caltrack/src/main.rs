//! `caltrack` - CLI for the calibration register
//!
//! This binary drives the caltrack library: account management, device
//! operations, the dashboard and exports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;

use caltrack::auth::{login_email, AuthProvider, LocalAuth};
use caltrack::cli::{
    CalibrateCommand, Cli, Command, ConfigCommand, Credentials, DashboardCommand, DeviceCommand,
    ExportArgs, ExportCommand, ListCommand, UserCommand,
};
use caltrack::export::{default_output_path, write_export, ExportFormat};
use caltrack::model::{Certificate, Device, User};
use caltrack::report::{certificate_file_name, history_rows, ReportContext, ReportRow};
use caltrack::service::{CalibrationInput, DeviceService};
use caltrack::status::latest_calibration;
use caltrack::store::{DocumentStore, SqliteStore};
use caltrack::view::{unique_manufacturers, unique_usages};
use caltrack::{init_logging, Config, Dashboard, Locale, Result};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;
    let locale = config.display.locale;

    run(cli.command, &config)
        .await
        .map_err(|e| e.user_message(locale).into())
}

/// Everything a command handler needs.
struct App {
    config: Config,
    auth: LocalAuth,
    devices: DeviceService,
    today: NaiveDate,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

impl App {
    async fn open(config: &Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::open(config.database_path())?);
        let auth = LocalAuth::new(store.clone(), config.auth.clone());
        let devices = DeviceService::open(store).await?;
        Ok(Self {
            config: config.clone(),
            auth,
            devices,
            today: chrono::Local::now().date_naive(),
        })
    }

    fn locale(&self) -> Locale {
        self.config.display.locale
    }

    fn report_context(&self) -> ReportContext {
        ReportContext::new(self.today, self.locale())
            .with_placeholder(self.config.export.placeholder.clone())
    }

    async fn login(&self, credentials: &Credentials) -> Result<User> {
        let email = login_email(&credentials.email);
        Ok(self.auth.login(&email, &credentials.password).await?)
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::User(cmd) => handle_user(&App::open(config).await?, cmd).await,
        Command::Device(cmd) => handle_device(&App::open(config).await?, cmd).await,
        Command::Dashboard(cmd) => handle_dashboard(&App::open(config).await?, &cmd),
        Command::Export(cmd) => handle_export(&App::open(config).await?, cmd),
        Command::Seed(credentials) => handle_seed(&App::open(config).await?, &credentials).await,
        // Needs no database.
        Command::Config(cmd) => handle_config(config, cmd),
    }
}

async fn handle_seed(app: &App, credentials: &Credentials) -> Result<()> {
    let user = app.login(credentials).await?;
    let seeded = app.devices.seed_demo_devices(&user, app.today).await?;
    println!("Seeded {} demo devices.", seeded.len());
    Ok(())
}

async fn handle_user(app: &App, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Register {
            email,
            password,
            username,
            role,
        } => {
            let user = app
                .auth
                .register(&email, &password, &username, role.into())
                .await?;
            println!("Registered {} ({}).", user.username, user.role);
        }
        UserCommand::Login(credentials) => {
            let user = app.login(&credentials).await?;
            let permissions = user.permissions();
            println!("Logged in as {} ({}).", user.username, user.role);
            println!("  Add devices:        {}", permissions.can_add);
            println!("  Record calibration: {}", permissions.can_calibrate);
            println!("  Delete devices:     {}", permissions.can_delete);
            app.auth.logout();
        }
    }
    Ok(())
}

async fn handle_device(app: &App, cmd: DeviceCommand) -> Result<()> {
    match cmd {
        DeviceCommand::Add(add) => {
            let user = app.login(&add.credentials).await?;
            let device = app.devices.add_device(&user, add.new_device()).await?;
            println!("Added {} with id {}.", device.name, device.id);
        }
        DeviceCommand::Calibrate(cal) => handle_calibrate(app, cal).await?,
        DeviceCommand::Delete { id, credentials } => {
            let user = app.login(&credentials).await?;
            app.devices.delete_device(&user, &id).await?;
            println!("Deleted {id}.");
        }
        DeviceCommand::List(list) => handle_list(app, &list)?,
        DeviceCommand::History { id, json } => {
            let device = app.devices.device(&id)?;
            let rows = history_rows(&device, &app.report_context());
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                let headers = app.locale().history_headers();
                println!("{}", device.name);
                println!("{:<12} {:<12} {:<18} {}", headers[0], headers[1], headers[2], headers[3]);
                for row in rows {
                    println!(
                        "{:<12} {:<12} {:<18} {}",
                        row.calibration_date, row.next_due, row.period, row.certificate
                    );
                }
            }
        }
        DeviceCommand::Filters { json } => {
            let devices = app.devices.devices();
            let manufacturers = unique_manufacturers(&devices);
            let usages = unique_usages(&devices);
            if json {
                let options = serde_json::json!({
                    "manufacturers": manufacturers,
                    "usages": usages,
                });
                println!("{}", serde_json::to_string_pretty(&options)?);
            } else {
                let headers = app.locale().report_headers();
                println!("{}: {}", headers[2], manufacturers.join(", "));
                println!("{}: {}", headers[4], usages.join(", "));
            }
        }
        DeviceCommand::Certificate { id, output } => {
            let device = app.devices.device(&id)?;
            let (Some(certificate), Some(file_name)) = (
                latest_calibration(&device).and_then(|c| c.certificate()),
                certificate_file_name(&device),
            ) else {
                println!("{} has no certificate.", device.name);
                return Ok(());
            };
            let path = output.unwrap_or_else(|| app.config.output_dir().join(file_name));
            std::fs::write(&path, &certificate.content)?;
            println!("Saved certificate to {}.", path.display());
        }
    }
    Ok(())
}

async fn handle_calibrate(app: &App, cmd: CalibrateCommand) -> Result<()> {
    let user = app.login(&cmd.credentials).await?;
    let certificate = cmd
        .certificate
        .as_deref()
        .map(read_certificate)
        .transpose()?;
    let input = CalibrationInput {
        calibration_date: cmd.date,
        period_years: cmd.period,
        certificate,
    };
    let device = app.devices.calibrate_device(&user, &cmd.id, input).await?;
    println!(
        "Calibrated {}. Next calibration: {}.",
        device.name,
        caltrack::service::next_due_preview(cmd.date, cmd.period, app.locale())
    );
    Ok(())
}

fn read_certificate(path: &Path) -> Result<Certificate> {
    let content = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(Certificate::new(content, file_name))
}

fn handle_list(app: &App, cmd: &ListCommand) -> Result<()> {
    let devices = app.devices.devices();
    let query = cmd.filter.to_query(app.locale());
    let dashboard = Dashboard::compute(&devices, &query, app.today);
    let ctx = app.report_context();

    if cmd.json {
        let displayed: Vec<&Device> = dashboard.displayed;
        println!("{}", serde_json::to_string_pretty(&displayed)?);
        return Ok(());
    }

    print_rows(
        app.locale(),
        dashboard
            .displayed
            .iter()
            .map(|device| (device.id.as_str(), ReportRow::project(device, &ctx))),
    );
    Ok(())
}

fn print_rows<'a>(locale: Locale, rows: impl Iterator<Item = (&'a str, ReportRow)>) {
    let headers = locale.report_headers();
    println!(
        "{:<36}  {:<24} {:<12} {:<14} {:<28} {:<12}",
        "ID", headers[0], headers[5], headers[6], headers[7], headers[8]
    );
    let mut count = 0;
    for (id, row) in rows {
        println!(
            "{:<36}  {:<24} {:<12} {:<14} {:<28} {:<12}",
            id, row.name, row.asset_code, row.status, row.calibration_date, row.next_due
        );
        count += 1;
    }
    println!();
    println!("{count} devices");
}

fn handle_dashboard(app: &App, cmd: &DashboardCommand) -> Result<()> {
    let devices = app.devices.devices();
    let query = cmd.filter.to_query(app.locale());
    let dashboard = Dashboard::compute(&devices, &query, app.today);
    let stats = &dashboard.stats;
    let locale = app.locale();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("{:<24} {}", locale.overdue_label(), stats.overdue_count);
    println!(
        "{:<24} {}",
        locale.due_this_month_label(),
        stats.due_soon_this_month_count
    );
    println!();
    println!("{} ({})", locale.device_status_label(), stats.total);
    for bucket in &stats.chart_buckets {
        println!(
            "  {:<20} {:>4}  {:>5.1}%",
            locale.status_short_label(bucket.status),
            bucket.count,
            bucket.percentage
        );
    }
    println!();
    println!("{} shown", dashboard.displayed.len());
    Ok(())
}

fn handle_export(app: &App, cmd: ExportCommand) -> Result<()> {
    let (format, args): (ExportFormat, ExportArgs) = match cmd {
        ExportCommand::Csv(args) => (ExportFormat::Csv, args),
        ExportCommand::Pdf(args) => (ExportFormat::Pdf, args),
    };
    let devices = app.devices.devices();
    let query = args.filter.to_query(app.locale());
    let dashboard = Dashboard::compute(&devices, &query, app.today);
    let ctx = app.report_context();

    let path = args
        .output
        .unwrap_or_else(|| default_output_path(&app.config.output_dir(), &ctx, format));
    let count = write_export(&path, format, dashboard.displayed, &ctx)?;
    println!("Exported {count} devices to {}.", path.display());
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:       {}", config.database_path().display());
                println!();
                println!("[Display]");
                println!("  Locale:              {}", config.display.locale);
                println!();
                println!("[Export]");
                println!("  Output directory:    {}", config.output_dir().display());
                println!("  Placeholder:         {}", config.export.placeholder);
                println!();
                println!("[Auth]");
                println!("  Max failed attempts: {}", config.auth.max_failed_attempts);
                println!("  Lockout minutes: {}", config.auth.lockout_minutes);
                println!("  Min password length: {}", config.auth.min_password_length);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
