//! Persistence for the ledger.
//!
//! # Tables
//!
//! - `app_user` - Buyers and admins (unique on `lower(email)`)
//! - `product` - Products, each optionally owned by an admin
//! - `consumption` - Ledger rows (cascade on user/product delete)
//! - `revoked_session` - Optional session revocation list
//!
//! # Backends
//!
//! Handlers only see the [`Store`] trait. [`postgres::PgStore`] is the durable
//! backend; [`memory::MemoryStore`] keeps everything in process and backs the
//! test suites and `CANTINA_STORE=memory`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p cantina-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use cantina_core::{ConsumptionId, Email, ProductId, Quantity, UserId};

use crate::models::{Consumption, LedgerEntry, NewProduct, NewUser, Product, ProfileUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

pub type StoreResult<T> = Result<T, RepositoryError>;

/// Typed CRUD and aggregate-input operations over users, products and the
/// ledger.
///
/// Every write touches a single row (or a single `DELETE ... WHERE`), so
/// backends need no multi-statement transactions. Listing operations return
/// rows in store order (insertion order).
#[async_trait]
pub trait Store: Send + Sync {
    /// Find a user whose email or war name equals `identifier`, ignoring case.
    ///
    /// `identifier` must already be trimmed and lower-cased. One query.
    async fn find_user_by_login(&self, identifier: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &Email) -> StoreResult<Option<User>>;
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> StoreResult<User>;
    /// Returns `RepositoryError::NotFound` if no user has this email.
    async fn set_admin(&self, email: &Email, is_admin: bool) -> StoreResult<User>;
    /// Oldest admin account, if any.
    async fn first_admin(&self) -> StoreResult<Option<User>>;

    async fn list_products(&self, include_unavailable: bool) -> StoreResult<Vec<Product>>;
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn create_product(&self, owner: UserId, product: NewProduct) -> StoreResult<Product>;
    /// Update a product owned by `owner` or not owned by anyone (which then
    /// becomes owned by `owner`). Anything else is `RepositoryError::NotFound`.
    async fn update_product(
        &self,
        id: ProductId,
        owner: UserId,
        product: NewProduct,
    ) -> StoreResult<Product>;
    /// Delete a product owned by `owner` or unowned, cascading to its
    /// consumptions. Returns whether a row was deleted.
    async fn delete_product(&self, id: ProductId, owner: UserId) -> StoreResult<bool>;
    /// Give every unowned product to `admin`. Returns the number assigned.
    async fn assign_unowned_products(&self, admin: UserId) -> StoreResult<u64>;

    async fn create_consumption(
        &self,
        user: UserId,
        product: ProductId,
        quantity: Quantity,
    ) -> StoreResult<Consumption>;
    /// All of `user`'s rows, joined with their current product.
    async fn list_consumptions_for_user(&self, user: UserId) -> StoreResult<Vec<LedgerEntry>>;
    /// All rows on products owned by `admin`, joined with their current product.
    async fn list_consumptions_for_admin(&self, admin: UserId) -> StoreResult<Vec<LedgerEntry>>;
    /// Delete one row by id. Returns the number of rows deleted (0 or 1).
    async fn delete_consumption(&self, id: ConsumptionId) -> StoreResult<u64>;
    /// Delete every row of `user`.
    async fn delete_consumptions_for_user(&self, user: UserId) -> StoreResult<u64>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}
