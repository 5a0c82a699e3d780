//! Session token codec.
//!
//! A session token is the standard base64 encoding of the JSON claims
//! `{id, email, warName, isAdmin}`. It travels in an HTTP-only, `SameSite=Lax`
//! cookie that lives for 30 days and is `Secure` outside development.
//!
//! Decoding never fails loudly: a missing, malformed or mistyped token is
//! simply "no session". Server-side revocation is optional and lives in
//! [`revocation`].

pub mod revocation;

pub use revocation::{
    MemorySessionStore, PgSessionStore, SessionStore, SessionStoreError, StatelessSessions,
};

use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use cookie::{Cookie, SameSite};

use crate::models::{SessionClaims, User};

/// Session lifetime (cookie `Max-Age` and revocation retention).
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Encodes, decodes and (re)sets the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    cookie_name: String,
    secure: bool,
}

impl SessionCodec {
    #[must_use]
    pub fn new(cookie_name: impl Into<String>, secure: bool) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            secure,
        }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Serialize claims into an opaque token.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the claims cannot be serialized.
    pub fn encode(claims: &SessionClaims) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(claims)?;
        Ok(STANDARD.encode(json))
    }

    /// Decode a token into claims, or `None` if it is not a valid session.
    #[must_use]
    pub fn decode(token: &str) -> Option<SessionClaims> {
        let bytes = STANDARD.decode(token.trim()).ok()?;
        let claims: SessionClaims = serde_json::from_slice(&bytes).ok()?;
        let blank = claims.email.trim().is_empty() || claims.war_name.trim().is_empty();
        (!blank).then_some(claims)
    }

    /// Issue a session for `user`: returns the token and the cookie carrying it.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if the claims cannot be serialized.
    pub fn create(&self, user: &User) -> Result<(String, Cookie<'static>), serde_json::Error> {
        let token = Self::encode(&SessionClaims::for_user(user))?;
        let cookie = self.cookie(token.clone(), SESSION_TTL);
        Ok((token, cookie))
    }

    /// A cookie that overwrites the session with zero lifetime.
    #[must_use]
    pub fn clear(&self) -> Cookie<'static> {
        self.cookie(String::new(), Duration::ZERO)
    }

    /// Find the session token in the request's `Cookie` headers.
    #[must_use]
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == self.cookie_name)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
    }

    /// Read the session from request headers: the raw token and its claims.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Option<(String, SessionClaims)> {
        let token = self.token_from_headers(headers)?;
        let claims = Self::decode(&token)?;
        Some((token, claims))
    }

    fn cookie(&self, value: String, max_age: Duration) -> Cookie<'static> {
        let max_age =
            cookie::time::Duration::seconds(i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX));
        Cookie::build((self.cookie_name.clone(), value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(max_age)
            .build()
    }
}

/// Render a cookie as a `Set-Cookie` header value.
///
/// # Errors
///
/// Returns `InvalidHeaderValue` if the cookie contains bytes not allowed in a header.
pub fn set_cookie_value(
    cookie: &Cookie<'_>,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    HeaderValue::from_str(&cookie.to_string())
}
