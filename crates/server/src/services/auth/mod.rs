//! Authentication service.
//!
//! Provides password login (by email or war name), registration and
//! self-service profile updates.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use cantina_core::{Email, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, ProfileUpdate, SessionClaims, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration payload as received; every field is required.
#[derive(Debug, Default, Clone)]
pub struct Registration {
    pub email: Option<String>,
    pub password: Option<String>,
    pub war_name: Option<String>,
    pub rank: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

/// Profile changes as received.
///
/// The four identity fields are required; blank `pix_key`/`qr_code_url`
/// clear them; a blank or absent `password` leaves the password unchanged.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub war_name: Option<String>,
    pub rank: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub pix_key: Option<String>,
    pub qr_code_url: Option<String>,
    pub password: Option<String>,
}

/// Authentication service.
///
/// Handles login, registration and profile updates against any [`Store`].
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Verify an identifier (email or war name) and password.
    ///
    /// The identifier is trimmed and lower-cased and matched against email
    /// OR war name in a single lookup. Blank input is rejected before the
    /// store is touched.
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingCredentials` if either field is missing or blank
    /// - `AuthError::UserNotFound` if nothing matches
    /// - `AuthError::InvalidCredentials` if the account has no password
    /// - `AuthError::IncorrectPassword` if the password does not match
    /// - `AuthError::Repository` if the store fails
    pub async fn login(
        &self,
        identifier: Option<&str>,
        password: Option<&str>,
    ) -> Result<User, AuthError> {
        let identifier = identifier
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingCredentials)?
            .to_lowercase();
        let password = password
            .filter(|p| !p.trim().is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        let user = self
            .store
            .find_user_by_login(&identifier)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::InvalidCredentials);
        };
        verify_password(password, hash)?;

        Ok(user)
    }

    /// Register a new (non-admin) user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is missing or blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let email = required(registration.email.as_deref())?;
        let password = registration
            .password
            .filter(|p| !p.trim().is_empty())
            .ok_or(AuthError::MissingFields)?;
        let war_name = required(registration.war_name.as_deref())?;
        let rank = required(registration.rank.as_deref())?;
        let company = required(registration.company.as_deref())?;
        let phone = required(registration.phone.as_deref())?;

        let email = Email::parse(&email)?;
        validate_password(&password)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&password)?;

        self.store
            .create_user(NewUser {
                email,
                war_name,
                rank,
                company,
                phone,
                is_admin: false,
                password_hash: Some(password_hash),
                pix_key: None,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })
    }

    /// Update the caller's own profile.
    ///
    /// `isAdmin` is never changed here; role changes go through the CLI and
    /// take effect at the next login.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotProfileOwner` if `target` is not the caller.
    /// Returns `AuthError::MissingFields` if a required field is blank.
    /// Returns `AuthError::WeakPassword` if a new password is too short.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn update_profile(
        &self,
        caller: &SessionClaims,
        target: UserId,
        changes: ProfileChanges,
    ) -> Result<User, AuthError> {
        if caller.id != target {
            return Err(AuthError::NotProfileOwner);
        }

        let war_name = required(changes.war_name.as_deref())?;
        let rank = required(changes.rank.as_deref())?;
        let company = required(changes.company.as_deref())?;
        let phone = required(changes.phone.as_deref())?;

        let password_hash = match changes.password.filter(|p| !p.trim().is_empty()) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        self.store
            .update_profile(
                target,
                ProfileUpdate {
                    war_name,
                    rank,
                    company,
                    phone,
                    pix_key: optional(changes.pix_key.as_deref()),
                    qr_code_url: optional(changes.qr_code_url.as_deref()),
                    password_hash,
                },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })
    }
}

/// Trimmed, non-empty required field.
fn required(value: Option<&str>) -> Result<String, AuthError> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or(AuthError::MissingFields)
}

/// Trimmed optional field; blank becomes `None`.
fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash (constant-time comparison).
///
/// An unparseable stored hash is treated like a missing one.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::IncorrectPassword)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::db::MemoryStore;

    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            email: Some(email.to_owned()),
            password: Some("pw123456".to_owned()),
            war_name: Some("Silva".to_owned()),
            rank: Some("Cb".to_owned()),
            company: Some("A".to_owned()),
            phone: Some("11999999999".to_owned()),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::IncorrectPassword)
        ));
    }

    #[test]
    fn test_verify_unparseable_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("pw", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_blank_fields_collapse_to_missing_credentials() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        for (id, pw) in [
            (None, None),
            (Some("a@b.com"), None),
            (None, Some("pw123456")),
            (Some("   "), Some("pw123456")),
            (Some("a@b.com"), Some("  ")),
        ] {
            assert!(matches!(
                auth.login(id, pw).await,
                Err(AuthError::MissingCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_login_is_case_insensitive_and_trims() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register(registration("test@x.com")).await.unwrap();

        let a = auth
            .login(Some("  TEST@X.COM  "), Some("pw123456"))
            .await
            .unwrap();
        let b = auth.login(Some("test@x.com"), Some("pw123456")).await.unwrap();
        assert_eq!(a.id, user.id);
        assert_eq!(b.id, user.id);
    }

    #[tokio::test]
    async fn test_login_by_war_name() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register(registration("a@b.com")).await.unwrap();

        let found = auth.login(Some("SILVA"), Some("pw123456")).await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_login_distinguishes_three_failures() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("a@b.com")).await.unwrap();
        store
            .create_user(NewUser {
                email: Email::parse("nopw@b.com").unwrap(),
                war_name: "Sem Senha".to_owned(),
                rank: "Sd".to_owned(),
                company: "B".to_owned(),
                phone: "1".to_owned(),
                is_admin: false,
                password_hash: None,
                pix_key: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            auth.login(Some("ghost@b.com"), Some("pw123456")).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.login(Some("nopw@b.com"), Some("pw123456")).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login(Some("a@b.com"), Some("wrong-password")).await,
            Err(AuthError::IncorrectPassword)
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let mut missing = registration("a@b.com");
        missing.rank = Some("  ".to_owned());
        assert!(matches!(
            auth.register(missing).await,
            Err(AuthError::MissingFields)
        ));

        let mut weak = registration("a@b.com");
        weak.password = Some("short".to_owned());
        assert!(matches!(
            auth.register(weak).await,
            Err(AuthError::WeakPassword(_))
        ));

        assert!(matches!(
            auth.register(registration("not-an-email")).await,
            Err(AuthError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("a@b.com")).await.unwrap();
        assert!(matches!(
            auth.register(registration("A@B.COM")).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_update_profile_only_by_owner() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register(registration("a@b.com")).await.unwrap();
        let other = auth.register(registration("c@d.com")).await.unwrap();
        let claims = SessionClaims::for_user(&user);

        let changes = ProfileChanges {
            war_name: Some("Souza".to_owned()),
            rank: Some("Sgt".to_owned()),
            company: Some("B".to_owned()),
            phone: Some("21".to_owned()),
            pix_key: Some("  ".to_owned()),
            qr_code_url: None,
            password: Some("new-password".to_owned()),
        };

        assert!(matches!(
            auth.update_profile(&claims, other.id, changes.clone()).await,
            Err(AuthError::NotProfileOwner)
        ));

        let updated = auth
            .update_profile(&claims, user.id, changes)
            .await
            .unwrap();
        assert_eq!(updated.war_name, "Souza");
        assert_eq!(updated.pix_key, None);
        assert!(!updated.is_admin);
        assert!(
            auth.login(Some("a@b.com"), Some("new-password"))
                .await
                .is_ok()
        );
    }
}
