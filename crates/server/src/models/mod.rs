//! Domain models for the ledger.
//!
//! These types are what the store hands out and what handlers serialize.
//! Secrets (password hashes) never leave [`User`]; responses use
//! [`PublicUser`] instead.

pub mod consumption;
pub mod product;
pub mod session;
pub mod user;

pub use consumption::{Consumption, LedgerEntry};
pub use product::{NewProduct, Product};
pub use session::{Caller, PresentedToken, SessionClaims};
pub use user::{NewUser, ProfileUpdate, PublicUser, User};
