//! Product maintenance commands.

use cantina_server::db::Store;

use super::CommandError;

/// Give every unowned product to the oldest admin account.
///
/// Products created before ownership existed have no admin and never show up
/// in anyone's aggregates until they are assigned.
///
/// # Errors
///
/// Returns `CommandError::NoAdmin` if no admin exists, or a database error.
pub async fn assign_orphans() -> Result<u64, CommandError> {
    let store = super::store().await?;

    let admin = store.first_admin().await?.ok_or(CommandError::NoAdmin)?;
    let assigned = store.assign_unowned_products(admin.id).await?;

    tracing::info!(
        admin_id = %admin.id,
        admin_email = %admin.email,
        assigned,
        "Unowned products assigned"
    );
    Ok(assigned)
}
