//! Authorization extractors.
//!
//! Every request is resolved to a [`Caller`] by the session middleware.
//! These extractors enforce the route-level rules on top of it:
//!
//! - [`RequireUser`] - any session, otherwise 401
//! - [`RequireAdmin`] - a session issued with `isAdmin`, otherwise 401
//! - [`RequireAnonymous`] - no session, otherwise 303 to the caller's home view
//! - [`OptionalAuth`] - never rejects

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use cantina_core::Role;

use crate::error::ApiError;
use crate::models::{Caller, SessionClaims};

fn caller(parts: &Parts) -> Caller {
    parts.extensions.get::<Caller>().cloned().unwrap_or_default()
}

/// Extractor that requires a session (user or admin).
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(claims): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.war_name)
/// }
/// ```
pub struct RequireUser(pub SessionClaims);

/// Extractor that requires a session issued to an admin.
pub struct RequireAdmin(pub SessionClaims);

/// Extractor for routes only anonymous callers may use (login, register,
/// guest login).
pub struct RequireAnonymous;

/// Extractor that optionally gets the current caller.
///
/// Unlike `RequireUser`, this does not reject the request if there is no
/// session.
pub struct OptionalAuth(pub Caller);

/// Error returned when a route's access rule is not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No valid session.
    NoSession,
    /// Session exists but was not issued to an admin.
    NotAdmin,
    /// Authenticated caller on an anonymous-only route.
    AlreadyAuthenticated(Role),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NoSession | Self::NotAdmin => {
                (StatusCode::UNAUTHORIZED, Json(ApiError::new("Unauthorized"))).into_response()
            }
            Self::AlreadyAuthenticated(role) => Redirect::to(role.home_path()).into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match caller(parts) {
            Caller::User(claims) | Caller::Admin(claims) => Ok(Self(claims)),
            Caller::Anonymous => {
                tracing::warn!(path = %parts.uri.path(), "Rejected: no session");
                Err(AuthRejection::NoSession)
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match caller(parts) {
            Caller::Admin(claims) => Ok(Self(claims)),
            Caller::User(claims) => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    user_id = %claims.id,
                    "Rejected: session is not admin"
                );
                Err(AuthRejection::NotAdmin)
            }
            Caller::Anonymous => {
                tracing::warn!(path = %parts.uri.path(), "Rejected: no session");
                Err(AuthRejection::NoSession)
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequireAnonymous
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match caller(parts).role() {
            None => Ok(Self),
            Some(role) => Err(AuthRejection::AlreadyAuthenticated(role)),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(caller(parts)))
    }
}
