//! Authentication.
//!
//! [`AuthProvider`] is the seam the rest of the crate talks to. [`LocalAuth`]
//! implements it over the `users` collection of a [`DocumentStore`], with
//! password digests computed by BLAKE3 in key-derivation mode. Failed logins
//! are counted in the `login_attempts` collection, so the limit holds across
//! processes sharing one database.

use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Error, Result};
use crate::model::{Role, User};
use crate::store::{DocumentStore, LOGIN_ATTEMPTS, USERS};

/// Domain appended to login names given without one.
pub const DEMO_DOMAIN: &str = "demo.com";

/// Key-derivation context for password digests.
const PASSWORD_CONTEXT: &str = "caltrack 2024-01-01 user password v1";

/// Expand a login name to an email address.
///
/// Names without `@` are shorthand for `<name>@demo.com`.
#[must_use]
pub fn login_email(login: &str) -> String {
    let login = login.trim();
    if login.contains('@') {
        login.to_string()
    } else {
        format!("{login}@{DEMO_DOMAIN}")
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email pattern"))
}

/// An identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Sign in and make the user current.
    async fn login(&self, email: &str, password: &str) -> std::result::Result<User, AuthError>;

    /// Create an account. Registration does not sign the new user in.
    async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> std::result::Result<User, AuthError>;

    /// The signed-in user, if any.
    fn current_user(&self) -> Option<User>;

    /// Sign out.
    fn logout(&self);

    /// The signed-in user, or [`Error::NotLoggedIn`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] when nobody is signed in.
    fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(Error::NotLoggedIn)
    }
}

/// Stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserProfile {
    uid: String,
    email: String,
    username: String,
    role: Role,
    password_salt: String,
    password_hash: String,
}

impl UserProfile {
    fn user(&self) -> User {
        User::new(self.username.clone(), self.role)
    }

    fn verify(&self, password: &str) -> bool {
        let Ok(expected) = blake3::Hash::from_hex(&self.password_hash) else {
            return false;
        };
        // blake3::Hash equality is constant time.
        digest_password(&self.password_salt, password) == expected
    }
}

fn digest_password(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize()
}

/// Failed logins for one email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginAttempts {
    email: String,
    failures: u32,
    last_failure_at: DateTime<Utc>,
}

impl LoginAttempts {
    /// Failures still counting at `now`. Zero once the window has passed.
    fn active_failures(&self, now: DateTime<Utc>, window: chrono::Duration) -> u32 {
        if now.signed_duration_since(self.last_failure_at) < window {
            self.failures
        } else {
            0
        }
    }
}

/// Authentication against locally stored profiles.
pub struct LocalAuth {
    store: Arc<dyn DocumentStore>,
    settings: AuthConfig,
    session: Mutex<Option<User>>,
}

impl std::fmt::Debug for LocalAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAuth")
            .field("settings", &self.settings)
            .field("current_user", &self.current_user())
            .finish_non_exhaustive()
    }
}

impl LocalAuth {
    /// Create a provider over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, settings: AuthConfig) -> Self {
        Self {
            store,
            settings,
            session: Mutex::new(None),
        }
    }

    async fn find_profile(&self, email: &str) -> std::result::Result<Option<UserProfile>, AuthError> {
        let records = self.store.fetch_all(USERS).await.map_err(|e| {
            warn!("Reading user profiles failed: {}", e);
            AuthError::NetworkFailure
        })?;
        Ok(records
            .into_iter()
            .filter_map(|record| serde_json::from_value::<UserProfile>(record).ok())
            .find(|profile| profile.email == email))
    }

    async fn failure_count(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<u32, AuthError> {
        let record = self.store.get(LOGIN_ATTEMPTS, email).await.map_err(|e| {
            warn!("Reading login attempts failed: {}", e);
            AuthError::NetworkFailure
        })?;
        Ok(record
            .and_then(|record| serde_json::from_value::<LoginAttempts>(record).ok())
            .map_or(0, |attempts| {
                attempts.active_failures(now, self.settings.lockout_window())
            }))
    }

    async fn record_failure(&self, email: &str, previous: u32, now: DateTime<Utc>) {
        let attempts = LoginAttempts {
            email: email.to_string(),
            failures: previous.saturating_add(1),
            last_failure_at: now,
        };
        let result = match serde_json::to_value(&attempts) {
            Ok(record) => self.store.upsert(LOGIN_ATTEMPTS, email, record).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("Recording failed login for {} failed: {}", email, e);
        }
    }

    async fn clear_failures(&self, email: &str) {
        if let Err(e) = self.store.delete(LOGIN_ATTEMPTS, email).await {
            warn!("Clearing login attempts for {} failed: {}", email, e);
        }
    }

    fn set_session(&self, user: Option<User>) {
        if let Ok(mut session) = self.session.lock() {
            *session = user;
        }
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn login(&self, email: &str, password: &str) -> std::result::Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        debug!("Login attempt for {}", email);

        let now = Utc::now();
        let failures = self.failure_count(&email, now).await?;
        if failures >= self.settings.max_failed_attempts {
            warn!("Login for {} refused after repeated failures", email);
            return Err(AuthError::RateLimited);
        }

        match self.find_profile(&email).await? {
            Some(profile) if profile.verify(password) => {
                if failures > 0 {
                    self.clear_failures(&email).await;
                }
                let user = profile.user();
                info!("Logged in as {} ({})", user.username, user.role);
                self.set_session(Some(user.clone()));
                Ok(user)
            }
            _ => {
                self.record_failure(&email, failures, now).await;
                warn!("Invalid credentials for {}", email);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        username: &str,
        role: Role,
    ) -> std::result::Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if !email_regex().is_match(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < self.settings.min_password_length {
            return Err(AuthError::WeakPassword);
        }
        if self.find_profile(&email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let uid = uuid::Uuid::new_v4().to_string();
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let profile = UserProfile {
            uid: uid.clone(),
            email: email.clone(),
            username: username.trim().to_string(),
            role,
            password_hash: digest_password(&salt, password).to_hex().to_string(),
            password_salt: salt,
        };
        let record = serde_json::to_value(&profile)
            .map_err(|e| AuthError::Unknown(format!("profile encoding: {e}")))?;
        self.store.upsert(USERS, &uid, record).await.map_err(|e| {
            warn!("Saving user profile failed: {}", e);
            AuthError::NetworkFailure
        })?;

        info!("Registered {} as {} ({})", email, profile.username, role);
        Ok(profile.user())
    }

    fn current_user(&self) -> Option<User> {
        self.session.lock().ok().and_then(|session| session.clone())
    }

    fn logout(&self) {
        self.set_session(None);
    }
}
