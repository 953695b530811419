//! Users, roles and the permissions derived from them.

use serde::{Deserialize, Serialize};

/// A user's role. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    /// Full access.
    Admin,
    /// May record calibrations.
    Moderator,
    /// Read-only access.
    #[default]
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::Moderator => write!(f, "Moderator"),
            Self::User => write!(f, "User"),
        }
    }
}

impl Role {
    /// The permissions granted by this role.
    #[must_use]
    pub fn permissions(self) -> Permissions {
        Permissions {
            can_add: self == Self::Admin,
            can_calibrate: matches!(self, Self::Admin | Self::Moderator),
            can_delete: self == Self::Admin,
        }
    }
}

/// Actions a role may perform. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Permissions {
    /// May register new devices.
    pub can_add: bool,
    /// May record calibration events.
    pub can_calibrate: bool,
    /// May delete devices.
    pub can_delete: bool,
}

/// The logged-in user as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name.
    pub username: String,
    /// Assigned role.
    pub role: Role,
}

impl User {
    /// Create a user.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// The permissions of this user's role.
    #[must_use]
    pub fn permissions(&self) -> Permissions {
        self.role.permissions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_permissions() {
        let perms = Role::Admin.permissions();
        assert!(perms.can_add);
        assert!(perms.can_calibrate);
        assert!(perms.can_delete);
    }

    #[test]
    fn test_moderator_permissions() {
        let perms = Role::Moderator.permissions();
        assert!(!perms.can_add);
        assert!(perms.can_calibrate);
        assert!(!perms.can_delete);
    }

    #[test]
    fn test_user_permissions() {
        assert_eq!(Role::User.permissions(), Permissions::default());
    }

    #[test]
    fn test_role_serde_matches_display() {
        for role in [Role::Admin, Role::Moderator, Role::User] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }
}
