//! Consumption route handlers.

use std::str::FromStr;

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::Value;

use cantina_core::{ConsumptionId, ProductId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::LedgerEntry;
use crate::routes::auth::Success;
use crate::routes::{parse_body, text};
use crate::services::ledger::{Ledger, UserLedger};
use crate::state::AppState;

/// New consumption request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConsumption {
    pub product_id: Option<Value>,
    pub quantity: Option<Value>,
}

/// Delete one consumption.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConsumption {
    pub consumption_id: Option<Value>,
}

/// Clear a user's consumptions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearConsumptions {
    pub user_id: Option<Value>,
}

fn parse_id<T: FromStr>(value: Option<&Value>) -> Option<T> {
    text(value).and_then(|s| s.trim().parse().ok())
}

/// The caller's rows and what they owe at current prices.
///
/// GET /api/consumptions
pub async fn index(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
) -> Result<Json<UserLedger>> {
    let ledger = Ledger::new(state.store()).for_user(claims.id).await?;
    Ok(Json(ledger))
}

/// Record a purchase for the caller.
///
/// POST /api/consumptions
pub async fn create(
    State(state): State<AppState>,
    RequireUser(claims): RequireUser,
    body: Bytes,
) -> Result<(StatusCode, Json<LedgerEntry>)> {
    let body: CreateConsumption = parse_body(&body).unwrap_or_default();
    let product: Option<ProductId> = parse_id(body.product_id.as_ref());
    let quantity = body.quantity.unwrap_or(Value::Null);

    let entry = Ledger::new(state.store())
        .record(claims.id, product, &quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Delete one consumption.
///
/// DELETE /api/admin/consumptions
///
/// An unknown id is a no-op.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Bytes,
) -> Result<Json<Success>> {
    let body: DeleteConsumption = parse_body(&body).unwrap_or_default();
    let id: ConsumptionId = parse_id(body.consumption_id.as_ref())
        .ok_or_else(|| AppError::BadRequest("Consumption ID required".to_owned()))?;

    Ledger::new(state.store()).delete(admin.id, id).await?;
    Ok(Success::ok())
}

/// Clear every row of a user.
///
/// POST /api/admin/consumptions
pub async fn clear_for_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Bytes,
) -> Result<Json<Success>> {
    let body: ClearConsumptions = parse_body(&body).unwrap_or_default();
    let user: UserId = parse_id(body.user_id.as_ref())
        .ok_or_else(|| AppError::BadRequest("User ID required".to_owned()))?;

    Ledger::new(state.store())
        .clear_all_for_user(admin.id, user)
        .await?;
    Ok(Success::ok())
}
