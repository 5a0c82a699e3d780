//! Pluggable server-side session revocation.
//!
//! Tokens are stateless by default ([`StatelessSessions`]): logout only clears
//! the cookie. The memory and Postgres stores remember revoked tokens (by
//! SHA-256, never the raw token) for the remaining session lifetime.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;

use super::SESSION_TTL;

/// Errors from a revocation backend.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Revocation policy consulted on every authenticated request.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn is_revoked(&self, token: &str) -> Result<bool, SessionStoreError>;
    async fn revoke(&self, token: &str) -> Result<(), SessionStoreError>;
    fn policy_name(&self) -> &'static str;
}

/// Hex-encoded SHA-256 of a token.
#[must_use]
pub fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// No revocation: every well-formed token is valid until its cookie expires.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatelessSessions;

#[async_trait]
impl SessionStore for StatelessSessions {
    async fn is_revoked(&self, _token: &str) -> Result<bool, SessionStoreError> {
        Ok(false)
    }

    async fn revoke(&self, _token: &str) -> Result<(), SessionStoreError> {
        Ok(())
    }

    fn policy_name(&self) -> &'static str {
        "none"
    }
}

/// Revocation list held in process memory. Lost on restart.
///
/// Entries leave only by expiry: a size bound would drop revoked hashes
/// and make their tokens valid again.
#[derive(Clone)]
pub struct MemorySessionStore {
    revoked: Cache<String, ()>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let revoked = Cache::builder().time_to_live(ttl).build();
        Self { revoked }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn is_revoked(&self, token: &str) -> Result<bool, SessionStoreError> {
        Ok(self.revoked.contains_key(&token_hash(token)))
    }

    async fn revoke(&self, token: &str) -> Result<(), SessionStoreError> {
        self.revoked.insert(token_hash(token), ()).await;
        Ok(())
    }

    fn policy_name(&self) -> &'static str {
        "memory"
    }
}

/// Revocation list in the `revoked_session` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn is_revoked(&self, token: &str) -> Result<bool, SessionStoreError> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (\
                 SELECT 1 FROM revoked_session WHERE token_hash = $1 AND expires_at > now()\
             )",
        )
        .bind(token_hash(token))
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }

    async fn revoke(&self, token: &str) -> Result<(), SessionStoreError> {
        let ttl = chrono::Duration::from_std(SESSION_TTL).unwrap_or(chrono::Duration::days(30));
        sqlx::query(
            "INSERT INTO revoked_session (token_hash, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_hash) DO NOTHING",
        )
        .bind(token_hash(token))
        .bind(Utc::now() + ttl)
        .execute(&self.pool)
        .await?;

        let purged = sqlx::query("DELETE FROM revoked_session WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired revoked sessions");
        }
        Ok(())
    }

    fn policy_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hash_is_stable_hex() {
        let a = token_hash("abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, token_hash("abc"));
        assert_ne!(a, token_hash("abd"));
    }

    #[tokio::test]
    async fn test_stateless_never_revokes() {
        let store = StatelessSessions;
        store.revoke("t").await.unwrap();
        assert!(!store.is_revoked("t").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_revokes() {
        let store = MemorySessionStore::new();
        assert!(!store.is_revoked("t").await.unwrap());
        store.revoke("t").await.unwrap();
        assert!(store.is_revoked("t").await.unwrap());
        assert!(!store.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_only_expires() {
        let store = MemorySessionStore::new();
        assert_eq!(store.revoked.policy().max_capacity(), None);
        assert_eq!(store.revoked.policy().time_to_live(), Some(SESSION_TTL));

        for i in 0..2_000 {
            store.revoke(&format!("token-{i}")).await.unwrap();
        }
        store.revoked.run_pending_tasks().await;
        assert!(store.is_revoked("token-0").await.unwrap());
        assert_eq!(store.revoked.entry_count(), 2_000);
    }
}
