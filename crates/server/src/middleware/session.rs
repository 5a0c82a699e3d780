//! Session resolution middleware.
//!
//! Reads the session cookie once per request, checks it against the
//! revocation policy, and stores the resulting [`Caller`] in the request
//! extensions for the extractors in [`super::auth`].

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::error::set_sentry_user;
use crate::models::{Caller, PresentedToken, SessionClaims};
use crate::services::session::SessionCodec;
use crate::state::AppState;

/// Resolve the caller from the session cookie.
///
/// A revoked token, or a revocation backend that cannot answer, makes the
/// caller anonymous. The raw cookie value is kept as [`PresentedToken`] so
/// logout can revoke it.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = state.codec().token_from_headers(request.headers());
    let claims = match token.as_deref() {
        Some(token) => resolve(&state, token).await,
        None => None,
    };

    if let Some(claims) = &claims {
        Span::current().record("user_id", tracing::field::display(claims.id));
        set_sentry_user(&claims.id, Some(claims.email.as_str()));
    }

    let extensions = request.extensions_mut();
    extensions.insert(Caller::from_claims(claims));
    if let Some(token) = token {
        extensions.insert(PresentedToken(token));
    }

    next.run(request).await
}

async fn resolve(state: &AppState, token: &str) -> Option<SessionClaims> {
    let claims = SessionCodec::decode(token)?;
    match state.sessions().is_revoked(token).await {
        Ok(false) => Some(claims),
        Ok(true) => {
            tracing::debug!(user_id = %claims.id, "Revoked session presented");
            None
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                policy = state.sessions().policy_name(),
                "Session revocation check failed"
            );
            None
        }
    }
}
