//! Session-related types.
//!
//! Types carried in the session token for authentication state.

use serde::{Deserialize, Serialize};

use cantina_core::{Role, UserId};

use super::User;

/// Claims carried in the client-held session token.
///
/// Exactly these four fields are issued. Decoding rejects tokens where any of
/// them is missing or has the wrong JSON type; unknown extra fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub id: UserId,
    pub email: String,
    pub war_name: String,
    pub is_admin: bool,
}

impl SessionClaims {
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            war_name: user.war_name.clone(),
            is_admin: user.is_admin,
        }
    }

    /// Role as issued. Never re-read from the store.
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::from_is_admin(self.is_admin)
    }
}

/// Who is making the request, resolved once per request by the session
/// middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Caller {
    #[default]
    Anonymous,
    User(SessionClaims),
    Admin(SessionClaims),
}

impl Caller {
    #[must_use]
    pub fn from_claims(claims: Option<SessionClaims>) -> Self {
        match claims {
            None => Self::Anonymous,
            Some(c) if c.is_admin => Self::Admin(c),
            Some(c) => Self::User(c),
        }
    }

    #[must_use]
    pub const fn claims(&self) -> Option<&SessionClaims> {
        match self {
            Self::Anonymous => None,
            Self::User(c) | Self::Admin(c) => Some(c),
        }
    }

    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self {
            Self::Anonymous => None,
            Self::User(_) => Some(Role::User),
            Self::Admin(_) => Some(Role::Admin),
        }
    }
}

/// The raw token presented by the caller, kept so logout can revoke it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedToken(pub String);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn claims(is_admin: bool) -> SessionClaims {
        SessionClaims {
            id: UserId::new(),
            email: "a@b.com".to_owned(),
            war_name: "Silva".to_owned(),
            is_admin,
        }
    }

    #[test]
    fn test_caller_from_claims() {
        assert_eq!(Caller::from_claims(None), Caller::Anonymous);
        assert!(matches!(
            Caller::from_claims(Some(claims(false))),
            Caller::User(_)
        ));
        assert!(matches!(
            Caller::from_claims(Some(claims(true))),
            Caller::Admin(_)
        ));
    }

    #[test]
    fn test_claims_serialize_camel_case() {
        let json = serde_json::to_value(claims(true)).unwrap();
        assert!(json.get("warName").is_some());
        assert_eq!(json["isAdmin"], serde_json::Value::Bool(true));
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
