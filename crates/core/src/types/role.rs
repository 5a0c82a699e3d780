//! Caller roles and guest account kinds.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of an authenticated caller, taken from the `isAdmin` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary buyer.
    User,
    /// Product owner who collects payment.
    Admin,
}

impl Role {
    #[must_use]
    pub const fn from_is_admin(is_admin: bool) -> Self {
        if is_admin { Self::Admin } else { Self::User }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Path of this role's home view.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::User => "/dashboard",
            Self::Admin => "/admin",
        }
    }
}

/// Error returned when a guest type is neither `client` nor `admin`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("guest type must be 'client' or 'admin' (got {0:?})")]
pub struct GuestKindError(pub String);

/// Which canonical guest account to log into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestKind {
    Client,
    Admin,
}

impl GuestKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Client => Role::User,
            Self::Admin => Role::Admin,
        }
    }
}

impl fmt::Display for GuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuestKind {
    type Err = GuestKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "admin" => Ok(Self::Admin),
            other => Err(GuestKindError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_claim() {
        assert_eq!(Role::from_is_admin(true), Role::Admin);
        assert_eq!(Role::from_is_admin(false), Role::User);
        assert_eq!(Role::Admin.home_path(), "/admin");
        assert_eq!(Role::User.home_path(), "/dashboard");
    }

    #[test]
    fn test_guest_kind_parse() {
        assert_eq!("client".parse::<GuestKind>().unwrap(), GuestKind::Client);
        assert_eq!("admin".parse::<GuestKind>().unwrap(), GuestKind::Admin);
        assert!("Admin".parse::<GuestKind>().is_err());
        assert!("".parse::<GuestKind>().is_err());
    }
}
