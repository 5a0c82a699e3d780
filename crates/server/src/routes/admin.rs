//! Admin aggregate route handlers.
//!
//! Every figure is computed from the calling admin's own products only.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::aggregate::{self, ProductSales, ProfitSummary, UserDebt};
use crate::state::AppState;

/// Profit summary.
///
/// GET /api/admin/profit
pub async fn profit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<ProfitSummary>> {
    let entries = state.store().list_consumptions_for_admin(admin.id).await?;
    Ok(Json(aggregate::profit_summary(&entries, admin.id)?))
}

/// Per-product sales, highest profit first.
///
/// GET /api/admin/products-sold
pub async fn products_sold(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<ProductSales>>> {
    let entries = state.store().list_consumptions_for_admin(admin.id).await?;
    Ok(Json(aggregate::products_sold(&entries, admin.id)?))
}

/// What each buyer owes the caller.
///
/// GET /api/admin/users
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<UserDebt>>> {
    let entries = state.store().list_consumptions_for_admin(admin.id).await?;
    let users = state.store().list_users().await?;
    Ok(Json(aggregate::debts_by_user(&entries, &users, admin.id)?))
}
