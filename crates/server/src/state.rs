//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use crate::config::{ConfigError, RevocationPolicy, ServerConfig, StoreBackend};
use crate::db::{self, MemoryStore, PgStore, Store};
use crate::services::session::{
    MemorySessionStore, PgSessionStore, SessionCodec, SessionStore, StatelessSessions,
};

/// Error building the application state at start-up.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the store, the revocation policy and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn Store>,
    sessions: Arc<dyn SessionStore>,
    codec: SessionCodec,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Ledger store (Postgres or in-memory)
    /// * `sessions` - Session revocation policy
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn Store>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let codec = SessionCodec::new(config.cookie_name.clone(), config.secure_cookies());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                sessions,
                codec,
            }),
        }
    }

    /// Build state from configuration, connecting to Postgres only when the
    /// store or the revocation policy needs it.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if a required database URL is missing or the
    /// pool cannot connect.
    pub async fn from_config(config: ServerConfig) -> Result<Self, StateError> {
        let needs_pool = config.store == StoreBackend::Postgres
            || config.session_revocation == RevocationPolicy::Postgres;
        let pool = if needs_pool {
            Some(connect(config.database_url.as_ref()).await?)
        } else {
            None
        };

        let store: Arc<dyn Store> = match (&pool, config.store) {
            (Some(pool), StoreBackend::Postgres) => Arc::new(PgStore::new(pool.clone())),
            _ => Arc::new(MemoryStore::new()),
        };
        let sessions: Arc<dyn SessionStore> = match (&pool, config.session_revocation) {
            (Some(pool), RevocationPolicy::Postgres) => {
                Arc::new(PgSessionStore::new(pool.clone()))
            }
            (_, RevocationPolicy::Memory) => Arc::new(MemorySessionStore::new()),
            _ => Arc::new(StatelessSessions),
        };

        tracing::info!(
            store = store.backend_name(),
            session_revocation = sessions.policy_name(),
            "Application state ready"
        );
        Ok(Self::new(config, store, sessions))
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the session revocation store.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.inner.sessions.as_ref()
    }

    /// Get a reference to the session cookie codec.
    #[must_use]
    pub fn codec(&self) -> &SessionCodec {
        &self.inner.codec
    }
}

async fn connect(url: Option<&SecretString>) -> Result<PgPool, StateError> {
    let url = url.ok_or_else(|| ConfigError::MissingEnvVar("CANTINA_DATABASE_URL".to_owned()))?;
    let pool = db::create_pool(url).await?;
    tracing::info!("Database pool created");
    Ok(pool)
}
