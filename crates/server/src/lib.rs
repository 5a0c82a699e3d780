//! Cantina server library.
//!
//! JSON API for a canteen consumption ledger: session-cookie authentication,
//! per-user consumption records, and per-admin profit aggregation.
//!
//! The binary in `main.rs` only wires configuration, logging and Sentry
//! around [`routes::build_router`]; everything else lives here so it can be
//! tested in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
