//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness
//! GET  /health/ready             - Readiness (store reachable)
//!
//! # Views (JSON view models)
//! GET  /                         - Redirect by role
//! GET  /dashboard                - User dashboard
//! GET  /admin                    - Admin console
//!
//! # Auth (anonymous only, except logout)
//! POST /api/auth/login           - Password login (email or war name)
//! POST /api/auth/register        - Create account
//! POST /api/auth/guest           - Guest login ({"type": "client" | "admin"})
//! POST /api/auth/logout          - Revoke and clear the session
//!
//! # Ledger
//! GET  /api/consumptions         - Caller's rows and total owed
//! POST /api/consumptions         - Record a purchase
//! DELETE /api/admin/consumptions - Delete one row (admin)
//! POST /api/admin/consumptions   - Clear a user's rows (admin)
//!
//! # Products
//! GET  /api/products             - List (?includeUnavailable=true)
//! POST /api/products             - Create or update (admin)
//! DELETE /api/products?id=       - Delete (admin)
//!
//! # Aggregates (admin)
//! GET  /api/admin/profit         - Profit summary
//! GET  /api/admin/products-sold  - Per-product sales
//! GET  /api/admin/users          - Per-buyer debts
//!
//! # Profile
//! PUT  /api/users/{id}           - Update own profile
//! ```

pub mod admin;
pub mod auth;
pub mod consumptions;
pub mod health;
pub mod products;
pub mod users;
pub mod views;

use axum::{
    Router,
    body::Bytes,
    http::{HeaderValue, Request, header},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use cookie::Cookie;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{request_id_middleware, session_middleware};
use crate::services::session::set_cookie_value;
use crate::state::AppState;

/// Create the auth API routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/guest", post(auth::guest))
        .route("/logout", post(auth::logout))
}

/// Create the admin API routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/consumptions",
            post(consumptions::clear_for_user).delete(consumptions::delete),
        )
        .route("/profit", get(admin::profit))
        .route("/products-sold", get(admin::products_sold))
        .route("/users", get(admin::users))
}

/// Create all API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
        .route(
            "/consumptions",
            get(consumptions::index).post(consumptions::create),
        )
        .route(
            "/products",
            get(products::index)
                .post(products::save)
                .delete(products::delete),
        )
        .route("/users/{id}", put(users::update_profile))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(views::root))
        .route("/dashboard", get(views::dashboard))
        .route("/admin", get(views::admin))
        .nest("/api", api_routes())
}

/// Build the full application router with its middleware stack.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
            user_id = tracing::field::Empty,
        )
    });

    routes()
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(trace)
        .with_state(state)
}

/// Parse a JSON request body.
///
/// Returns `None` for an empty, malformed or mistyped body; each route maps
/// that to its own validation error.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Option<T> {
    serde_json::from_slice(body).ok()
}

/// A JSON field as a string; any other JSON type counts as missing.
pub(crate) fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

/// Attach a `Set-Cookie` header to a response.
pub(crate) fn with_cookie(
    response: impl IntoResponse,
    cookie: &Cookie<'_>,
) -> Result<Response, AppError> {
    let value: HeaderValue =
        set_cookie_value(cookie).map_err(|e| AppError::Internal(e.to_string()))?;
    let mut response = response.into_response();
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}
