//! User-facing labels for the supported locales.
//!
//! Only the strings the library itself produces live here: status labels,
//! export headers, error messages and period text. Everything else belongs to
//! whatever presentation layer sits on top.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::status::Status;

/// Display date pattern shared by every locale.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// A supported display locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// Slovak.
    #[default]
    Sk,
    /// English.
    En,
    /// German.
    De,
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sk => write!(f, "sk"),
            Self::En => write!(f, "en"),
            Self::De => write!(f, "de"),
        }
    }
}

impl Locale {
    /// Format a calendar date as `dd.MM.yyyy`.
    #[must_use]
    pub fn format_date(self, date: NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Long status label, used in tables and exports.
    #[must_use]
    pub fn status_label(self, status: Status) -> &'static str {
        match (self, status) {
            (Self::Sk, Status::Valid) => "Platná",
            (Self::Sk, Status::DueSoon) => "Končí platnosť",
            (Self::Sk, Status::Overdue) => "Neplatná",
            (Self::Sk, Status::Uncalibrated) => "Nekalibrované",
            (Self::Sk, Status::CalibrationFree) => "Kalibrácia nie je potrebná",
            (Self::En, Status::Valid) => "Valid",
            (Self::En, Status::DueSoon) => "Due soon",
            (Self::En, Status::Overdue) => "Overdue",
            (Self::En, Status::Uncalibrated) => "Uncalibrated",
            (Self::En, Status::CalibrationFree) => "Calibration not required",
            (Self::De, Status::Valid) => "Gültig",
            (Self::De, Status::DueSoon) => "Bald fällig",
            (Self::De, Status::Overdue) => "Überfällig",
            (Self::De, Status::Uncalibrated) => "Unkalibriert",
            (Self::De, Status::CalibrationFree) => "Kalibrierung nicht erforderlich",
        }
    }

    /// Short status label, used for chart legends.
    #[must_use]
    pub fn status_short_label(self, status: Status) -> &'static str {
        match (self, status) {
            (Self::Sk, Status::DueSoon) => "Končí",
            (Self::Sk, Status::Uncalibrated) => "Nekalib.",
            (Self::Sk, Status::CalibrationFree) => "Bez kalib.",
            (Self::En, Status::DueSoon) => "Due",
            (Self::En, Status::Uncalibrated) => "Uncalib.",
            (Self::En, Status::CalibrationFree) => "No calib.",
            (Self::De, Status::DueSoon) => "Fällig",
            (Self::De, Status::Uncalibrated) => "Unkalib.",
            (Self::De, Status::CalibrationFree) => "Keine Kalib.",
            (locale, status) => locale.status_label(status),
        }
    }

    /// Column headers of the device report, in row order.
    #[must_use]
    pub fn report_headers(self) -> [&'static str; 9] {
        match self {
            Self::Sk => [
                "Názov",
                "Sériové číslo",
                "Výrobca",
                "Model",
                "Použitie",
                "MSN kód",
                "Stav",
                "Dátum kalibrácie",
                "Platnosť do",
            ],
            Self::En => [
                "Name",
                "Serial number",
                "Manufacturer",
                "Model",
                "Usage",
                "MSN code",
                "Status",
                "Calibration date",
                "Valid until",
            ],
            Self::De => [
                "Name",
                "Seriennummer",
                "Hersteller",
                "Modell",
                "Verwendung",
                "MSN-Code",
                "Status",
                "Kalibrierungsdatum",
                "Gültig bis",
            ],
        }
    }

    /// Column headers of the calibration history table, in row order.
    #[must_use]
    pub fn history_headers(self) -> [&'static str; 4] {
        match self {
            Self::Sk => ["Dátum kalibrácie", "Platnosť do", "Perióda", "Certifikát"],
            Self::En => ["Calibration date", "Valid until", "Period", "Certificate"],
            Self::De => ["Kalibrierungsdatum", "Gültig bis", "Periode", "Zertifikat"],
        }
    }

    /// Human text for a calibration period.
    #[must_use]
    pub fn period_text(self, years: u32) -> String {
        if years == 0 {
            return match self {
                Self::Sk | Self::En => "Calibration free".to_string(),
                Self::De => "Kalibrierungsfrei".to_string(),
            };
        }
        let unit = match (self, years) {
            (Self::Sk, 1) => "rok",
            (Self::Sk, 2..=4) => "roky",
            (Self::Sk, _) => "rokov",
            (Self::En, 1) => "year",
            (Self::En, _) => "years",
            (Self::De, 1) => "Jahr",
            (Self::De, _) => "Jahre",
        };
        format!("{years} {unit}")
    }

    /// Shown in place of a next-due date when none is required.
    #[must_use]
    pub fn not_required(self) -> &'static str {
        match self {
            Self::Sk => "Nevyžaduje sa",
            Self::En => "Not required",
            Self::De => "Nicht erforderlich",
        }
    }

    /// Title of the device report and stem of exported file names.
    #[must_use]
    pub fn export_file_stem(self) -> &'static str {
        match self {
            Self::Sk => "evidencia_kalibracii",
            Self::En => "calibration_record",
            Self::De => "kalibrierungsprotokoll",
        }
    }

    /// Dashboard label for the overdue counter.
    #[must_use]
    pub fn overdue_label(self) -> &'static str {
        match self {
            Self::Sk => "Po termíne",
            Self::En => "Overdue",
            Self::De => "Überfällig",
        }
    }

    /// Dashboard label for the due-this-month counter.
    #[must_use]
    pub fn due_this_month_label(self) -> &'static str {
        match self {
            Self::Sk => "Končí tento mesiac",
            Self::En => "Due this month",
            Self::De => "Diesen Monat fällig",
        }
    }

    /// Dashboard heading of the status chart.
    #[must_use]
    pub fn device_status_label(self) -> &'static str {
        match self {
            Self::Sk => "Stav zariadení",
            Self::En => "Device Status",
            Self::De => "Gerätestatus",
        }
    }

    /// Generic message for a failed save.
    #[must_use]
    pub fn error_saving(self) -> &'static str {
        match self {
            Self::Sk => "Chyba pri ukladaní zariadenia do databázy.",
            Self::En => "Saving to the database failed.",
            Self::De => "Speichern in der Datenbank fehlgeschlagen.",
        }
    }

    /// Generic message for a failed delete.
    #[must_use]
    pub fn error_deleting(self) -> &'static str {
        match self {
            Self::Sk => "Chyba pri odstraňovaní zariadenia.",
            Self::En => "Deleting the device failed.",
            Self::De => "Löschen des Geräts fehlgeschlagen.",
        }
    }

    /// Localized message for an authentication failure.
    #[must_use]
    pub fn auth_message(self, error: &AuthError) -> &'static str {
        match (self, error) {
            (Self::Sk, AuthError::InvalidCredentials) => "Nesprávny email alebo heslo.",
            (Self::Sk, AuthError::RateLimited) => "Príliš mnoho pokusov. Skúste neskôr.",
            (Self::Sk, AuthError::NetworkFailure) => "Chyba pripojenia k sieti.",
            (Self::Sk, AuthError::EmailInUse) => "Email už existuje.",
            (Self::Sk, AuthError::WeakPassword) => "Heslo je príliš slabé.",
            (Self::Sk, AuthError::InvalidEmail) => "Neplatný email.",
            (Self::Sk, AuthError::Unknown(_)) => "Chyba pri prihlásení.",
            (Self::En, AuthError::InvalidCredentials) => "Incorrect email or password.",
            (Self::En, AuthError::RateLimited) => "Too many attempts. Try again later.",
            (Self::En, AuthError::NetworkFailure) => "Network connection error.",
            (Self::En, AuthError::EmailInUse) => "Email already exists.",
            (Self::En, AuthError::WeakPassword) => "Password is too weak.",
            (Self::En, AuthError::InvalidEmail) => "Invalid email.",
            (Self::En, AuthError::Unknown(_)) => "Login failed.",
            (Self::De, AuthError::InvalidCredentials) => "Falsche E-Mail oder falsches Passwort.",
            (Self::De, AuthError::RateLimited) => {
                "Zu viele Versuche. Versuchen Sie es später erneut."
            }
            (Self::De, AuthError::NetworkFailure) => "Netzwerkverbindungsfehler.",
            (Self::De, AuthError::EmailInUse) => "E-Mail existiert bereits.",
            (Self::De, AuthError::WeakPassword) => "Passwort ist zu schwach.",
            (Self::De, AuthError::InvalidEmail) => "Ungültige E-Mail.",
            (Self::De, AuthError::Unknown(_)) => "Anmeldung fehlgeschlagen.",
        }
    }
}
