//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::traits::Document;
use murmur_core::types::{Principal, UserId};

/// A registered user.
///
/// Accounts are created either by password registration or implicitly on
/// the first successful OTP verification for an identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Normalised email address.
    pub email: Option<String>,
    /// Normalised phone number (`+` followed by digits).
    pub phone_number: Option<String>,
    /// Human-readable display name.
    pub display_name: String,
    /// Argon2 password hash. Absent for OTP-only accounts.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    /// Whether the user proved ownership of an identifier.
    pub verified: bool,
    /// Mirrors the presence tracker.
    pub online: bool,
    /// Set when the user's last connection closed.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh, unverified account.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: None,
            phone_number: None,
            display_name: display_name.into(),
            password_hash: None,
            verified: false,
            online: false,
            last_seen_at: None,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    /// Build an account for a verified OTP identifier.
    ///
    /// Email identifiers take the local part as display name; phone
    /// identifiers get a generic one.
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier.split_once('@') {
            Some((local, _)) => Self {
                email: Some(identifier.to_string()),
                ..Self::new(local)
            },
            None => Self {
                phone_number: Some(identifier.to_string()),
                ..Self::new("User")
            },
        }
    }

    /// The identity carried in bearer tokens for this user.
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.display_name.clone())
    }
}

impl Document for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_email_identifier() {
        let user = User::from_identifier("alice@example.com");
        assert_eq!(user.display_name, "alice");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert!(user.phone_number.is_none());
    }

    #[test]
    fn test_from_phone_identifier() {
        let user = User::from_identifier("+919876543210");
        assert_eq!(user.display_name, "User");
        assert_eq!(user.phone_number.as_deref(), Some("+919876543210"));
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let mut user = User::new("bob");
        user.password_hash = Some("$argon2id$secret".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
