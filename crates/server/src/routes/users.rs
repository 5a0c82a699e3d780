//! Profile route handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::Value;

use cantina_core::UserId;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::PublicUser;
use crate::routes::{parse_body, text};
use crate::services::auth::{AuthError, AuthService, ProfileChanges};
use crate::state::AppState;

/// Profile form data.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub war_name: Option<Value>,
    pub rank: Option<Value>,
    pub company: Option<Value>,
    pub phone: Option<Value>,
    pub pix_key: Option<Value>,
    pub qr_code_url: Option<Value>,
    pub password: Option<Value>,
}

/// Update the caller's own profile.
///
/// PUT /api/users/{id}
///
/// `isAdmin` in the body is ignored.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PublicUser>> {
    let target: UserId = id.parse().map_err(|_| AppError::Unauthorized)?;
    if target != claims.id {
        return Err(AuthError::NotProfileOwner.into());
    }

    let body: ProfileBody = parse_body(&body).ok_or(AuthError::MissingFields)?;
    let field = |v: Option<&Value>| text(v).map(str::to_owned);
    let changes = ProfileChanges {
        war_name: field(body.war_name.as_ref()),
        rank: field(body.rank.as_ref()),
        company: field(body.company.as_ref()),
        phone: field(body.phone.as_ref()),
        pix_key: field(body.pix_key.as_ref()),
        qr_code_url: field(body.qr_code_url.as_ref()),
        password: field(body.password.as_ref()),
    };

    let user = AuthService::new(state.store())
        .update_profile(&claims, target, changes)
        .await?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user.public()))
}
