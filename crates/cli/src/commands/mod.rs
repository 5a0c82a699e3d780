//! CLI subcommands.

pub mod migrate;
pub mod products;
pub mod users;
pub mod watch;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use cantina_server::db::{self, PgStore, RepositoryError};

/// Errors shared by the database-backed commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user has the given email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    /// The store has no admin account.
    #[error("No admin account exists; promote a user first")]
    NoAdmin,
}

/// Read the database URL from `CANTINA_DATABASE_URL`, falling back to
/// `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("CANTINA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("CANTINA_DATABASE_URL"))
}

async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}

async fn store() -> Result<PgStore, CommandError> {
    Ok(PgStore::new(connect().await?))
}
