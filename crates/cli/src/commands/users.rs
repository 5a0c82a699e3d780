//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! cantina-cli users promote -e admin@example.com
//! ```

use cantina_core::Email;
use cantina_server::db::{RepositoryError, Store};

use super::CommandError;

/// Grant admin rights to the user with `email`.
///
/// Sessions carry the admin flag, so the change applies from the user's next
/// login.
///
/// # Errors
///
/// Returns `CommandError::InvalidEmail` or `CommandError::UserNotFound`, or a
/// database error.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|_| CommandError::InvalidEmail(email.to_owned()))?;
    let store = super::store().await?;

    let user = store
        .set_admin(&email, true)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CommandError::UserNotFound(email.as_str().to_owned()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    tracing::warn!("The new role takes effect at the user's next login");
    Ok(())
}
