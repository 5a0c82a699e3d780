//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Credential verification, registration and profile updates
//! - `session` - Session cookie codec and revocation stores
//! - `ledger` - Recording and deleting consumptions
//! - `aggregate` - Per-admin profit and per-buyer debt summaries
//! - `guest` - Canonical guest accounts

pub mod aggregate;
pub mod auth;
pub mod guest;
pub mod ledger;
pub mod session;
