//! Authentication route handlers.
//!
//! Login, registration and guest login are anonymous-only: a caller who
//! already has a session is redirected to their home view.

use std::str::FromStr;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cantina_core::{GuestKind, UserId};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::RequireAnonymous;
use crate::models::{PresentedToken, SessionClaims, User};
use crate::routes::{parse_body, text, with_cookie};
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::services::guest::login_as_guest;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    /// Email or war name.
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub email: Option<Value>,
    pub password: Option<Value>,
    pub war_name: Option<Value>,
    pub rank: Option<Value>,
    pub company: Option<Value>,
    pub phone: Option<Value>,
}

/// Guest login request.
#[derive(Debug, Default, Deserialize)]
pub struct GuestBody {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
}

/// `{success: true, user}` response.
#[derive(Debug, Serialize)]
pub struct AuthResponse<U> {
    pub success: bool,
    pub user: U,
}

/// User summary returned by registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub id: UserId,
    pub email: String,
    pub war_name: String,
}

/// `{success: true}` response.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    #[must_use]
    pub const fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Issue a session cookie for `user` on top of `response`.
fn start_session(
    state: &AppState,
    user: &User,
    response: impl axum::response::IntoResponse,
) -> Result<Response> {
    let (_, cookie) = state
        .codec()
        .create(user)
        .map_err(|e| AppError::Internal(format!("failed to encode session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    with_cookie(response, &cookie)
}

/// Handle login form submission.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    _anonymous: RequireAnonymous,
    body: Bytes,
) -> Result<Response> {
    let body: LoginBody = parse_body(&body).ok_or(AuthError::MissingCredentials)?;

    let user = AuthService::new(state.store())
        .login(text(body.email.as_ref()), text(body.password.as_ref()))
        .await
        .inspect_err(|e| {
            if !e.is_internal() {
                tracing::info!(reason = %e, "Login rejected");
            }
        })?;

    tracing::info!(user_id = %user.id, is_admin = user.is_admin, "User logged in");

    let response = Json(AuthResponse {
        success: true,
        user: SessionClaims::for_user(&user),
    });
    start_session(&state, &user, response)
}

/// Handle registration form submission.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    _anonymous: RequireAnonymous,
    body: Bytes,
) -> Result<Response> {
    let body: RegisterBody = parse_body(&body).ok_or(AuthError::MissingFields)?;
    let field = |v: Option<&Value>| text(v).map(str::to_owned);

    let registration = Registration {
        email: field(body.email.as_ref()),
        password: field(body.password.as_ref()),
        war_name: field(body.war_name.as_ref()),
        rank: field(body.rank.as_ref()),
        company: field(body.company.as_ref()),
        phone: field(body.phone.as_ref()),
    };

    let user = AuthService::new(state.store()).register(registration).await?;

    tracing::info!(user_id = %user.id, "User registered");

    let response = (
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: RegisteredUser {
                id: user.id,
                email: user.email.as_str().to_owned(),
                war_name: user.war_name.clone(),
            },
        }),
    );
    start_session(&state, &user, response)
}

/// Log in as the canonical guest of the requested type.
///
/// POST /api/auth/guest
pub async fn guest(
    State(state): State<AppState>,
    _anonymous: RequireAnonymous,
    body: Bytes,
) -> Result<Response> {
    let body: GuestBody = parse_body(&body).unwrap_or_default();
    let raw = text(body.kind.as_ref()).unwrap_or_default();
    let kind = GuestKind::from_str(raw).map_err(AuthError::from)?;

    let user = login_as_guest(state.store(), kind).await?;

    tracing::info!(user_id = %user.id, guest = kind.as_str(), "Guest logged in");

    let response = Json(AuthResponse {
        success: true,
        user: SessionClaims::for_user(&user),
    });
    start_session(&state, &user, response)
}

/// Handle logout.
///
/// POST /api/auth/logout
///
/// Always succeeds. The presented token is revoked when a revocation policy
/// is configured; a failing backend is logged and the cookie is still
/// cleared.
pub async fn logout(
    State(state): State<AppState>,
    token: Option<Extension<PresentedToken>>,
) -> Result<Response> {
    if let Some(Extension(PresentedToken(token))) = token {
        if let Err(e) = state.sessions().revoke(&token).await {
            tracing::error!(error = %e, "Failed to revoke session");
        }
    }

    clear_sentry_user();
    with_cookie(Success::ok(), &state.codec().clear())
}
