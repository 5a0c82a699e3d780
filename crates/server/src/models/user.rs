//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cantina_core::{Email, Role, UserId};

/// A ledger user, buyer or admin (domain type).
///
/// Carries the password hash; convert to [`PublicUser`] before responding.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// Display name ("nome de guerra").
    pub war_name: String,
    pub rank: String,
    pub company: String,
    pub phone: String,
    pub is_admin: bool,
    /// Argon2 PHC string. `None` means the account cannot log in with a password.
    pub password_hash: Option<String>,
    /// Payment key shown to buyers (admins only).
    pub pix_key: Option<String>,
    pub qr_code_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::from_is_admin(self.is_admin)
    }

    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            war_name: self.war_name.clone(),
            rank: self.rank.clone(),
            company: self.company.clone(),
            phone: self.phone.clone(),
            is_admin: self.is_admin,
            pix_key: self.pix_key.clone(),
            qr_code_url: self.qr_code_url.clone(),
        }
    }
}

/// User as exposed over the API (no secrets).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub email: Email,
    pub war_name: String,
    pub rank: String,
    pub company: String,
    pub phone: String,
    pub is_admin: bool,
    pub pix_key: Option<String>,
    pub qr_code_url: Option<String>,
}

/// Fields for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub war_name: String,
    pub rank: String,
    pub company: String,
    pub phone: String,
    pub is_admin: bool,
    pub password_hash: Option<String>,
    pub pix_key: Option<String>,
}

/// Fields a user may change on their own profile.
///
/// `password_hash` is only replaced when `Some`; `is_admin` is not editable.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub war_name: String,
    pub rank: String,
    pub company: String,
    pub phone: String,
    pub pix_key: Option<String>,
    pub qr_code_url: Option<String>,
    pub password_hash: Option<String>,
}
