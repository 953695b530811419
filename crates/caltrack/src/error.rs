//! Error types for caltrack.
//!
//! This module defines all error types used throughout the caltrack crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::i18n::Locale;

/// The main error type for caltrack operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Validation Errors ===
    /// A single submitted field failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// One or more submitted fields failed validation.
    #[error("validation failed: {}", format_failures(.0))]
    ValidationFailed(Vec<FieldError>),

    // === Permission Errors ===
    /// The current user's role does not allow the action.
    #[error("permission denied: {action}")]
    PermissionDenied {
        /// The action that was refused.
        action: &'static str,
    },

    /// No user is logged in.
    #[error("not logged in")]
    NotLoggedIn,

    // === Lookup Errors ===
    /// The requested device does not exist in the current snapshot.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    // === Store Errors ===
    /// Persisting a document failed.
    #[error("save failed: {0}")]
    SaveFailed(String),

    /// Deleting a document failed.
    #[error("delete failed: {0}")]
    DeleteFailed(String),

    // === Auth Errors ===
    /// Authentication or registration was rejected.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    // === Database Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for caltrack operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Description of the failure.
    pub message: String,
}

impl FieldError {
    /// Create a new field error.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_failures(failures: &[FieldError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Classified authentication failures.
///
/// Provider error codes are folded into this closed set so callers can show a
/// localized message without knowing the provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Too many failed attempts.
    #[error("too many attempts")]
    RateLimited,
    /// The provider could not be reached.
    #[error("network failure")]
    NetworkFailure,
    /// Registration with an email that already exists.
    #[error("email already in use")]
    EmailInUse,
    /// Registration with a password below the minimum strength.
    #[error("password too weak")]
    WeakPassword,
    /// Registration with a malformed email address.
    #[error("invalid email")]
    InvalidEmail,
    /// Any code the provider reports that is not classified above.
    #[error("unknown auth error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Classify a provider error code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/user-not-found" | "auth/wrong-password" | "auth/invalid-credential" => {
                Self::InvalidCredentials
            }
            "auth/too-many-requests" => Self::RateLimited,
            "auth/network-request-failed" => Self::NetworkFailure,
            "auth/email-already-in-use" => Self::EmailInUse,
            "auth/weak-password" => Self::WeakPassword,
            "auth/invalid-email" => Self::InvalidEmail,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The localized, user-facing message for this failure.
    #[must_use]
    pub fn localized(&self, locale: Locale) -> &'static str {
        locale.auth_message(self)
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a single-field validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Check if this error is a validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::ValidationFailed(_))
    }

    /// Check if this error is a permission issue.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::NotLoggedIn)
    }

    /// The names of every field that failed validation.
    #[must_use]
    pub fn failed_fields(&self) -> Vec<&'static str> {
        match self {
            Self::Validation { field, .. } => vec![*field],
            Self::ValidationFailed(failures) => failures.iter().map(|f| f.field).collect(),
            _ => Vec::new(),
        }
    }

    /// The localized message a user interface shows for this error.
    ///
    /// Store failures collapse to a generic message; no field detail is shown
    /// for them.
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            Self::Auth(auth) => auth.localized(locale).to_string(),
            Self::SaveFailed(_) => locale.error_saving().to_string(),
            Self::DeleteFailed(_) => locale.error_deleting().to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DeviceNotFound("abc".to_string());
        assert_eq!(err.to_string(), "device not found: abc");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_validation_failed_lists_every_field() {
        let err = Error::ValidationFailed(vec![
            FieldError::new("name", "is required"),
            FieldError::new("asset_code", "must match L-NN-NN-NNNN"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("name: is required"));
        assert!(msg.contains("asset_code"));
        assert_eq!(err.failed_fields(), vec!["name", "asset_code"]);
        assert!(err.is_validation());
    }

    #[test]
    fn test_single_validation_error() {
        let err = Error::validation("period_years", "too large");
        assert_eq!(err.to_string(), "invalid period_years: too large");
        assert_eq!(err.failed_fields(), vec!["period_years"]);
    }

    #[test]
    fn test_permission_error() {
        let err = Error::PermissionDenied { action: "delete" };
        assert!(err.is_permission_error());
        assert!(Error::NotLoggedIn.is_permission_error());
        assert!(!Error::internal("x").is_permission_error());
    }

    #[test]
    fn test_auth_error_from_code() {
        assert_eq!(
            AuthError::from_code("auth/user-not-found"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::from_code("auth/wrong-password"),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            AuthError::from_code("auth/too-many-requests"),
            AuthError::RateLimited
        );
        assert_eq!(
            AuthError::from_code("auth/network-request-failed"),
            AuthError::NetworkFailure
        );
        assert_eq!(
            AuthError::from_code("auth/quota-exceeded"),
            AuthError::Unknown("auth/quota-exceeded".to_string())
        );
    }

    #[test]
    fn test_store_failures_use_generic_message() {
        let err = Error::SaveFailed("disk I/O error".to_string());
        let msg = err.user_message(Locale::En);
        assert!(!msg.contains("disk"));
        assert_eq!(msg, Locale::En.error_saving());

        let err = Error::DeleteFailed("locked".to_string());
        assert_eq!(err.user_message(Locale::En), Locale::En.error_deleting());
    }

    #[test]
    fn test_auth_user_message_is_localized() {
        let err: Error = AuthError::InvalidCredentials.into();
        assert_eq!(
            err.user_message(Locale::Sk),
            Locale::Sk.auth_message(&AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }
}
