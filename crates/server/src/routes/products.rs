//! Product route handlers.

use std::str::FromStr;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use cantina_core::{Price, ProductId};

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product};
use crate::routes::auth::Success;
use crate::routes::{parse_body, text};
use crate::state::AppState;

/// Product listing query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    /// `true` to include unavailable products.
    pub include_unavailable: Option<String>,
}

/// Product delete query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// Create-or-update request. An `id` selects an existing product.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProduct {
    pub id: Option<Value>,
    pub name: Option<Value>,
    pub price: Option<Value>,
    pub available: Option<Value>,
    pub image_url: Option<Value>,
}

fn bad_request(msg: &str) -> AppError {
    AppError::BadRequest(msg.to_owned())
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

/// Price from a JSON number or numeric string, rounded to cents and
/// bounded by [`Price::MAX`].
fn parse_price(value: Option<&Value>) -> Option<Price> {
    let raw = match value? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    let amount = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()?;
    Price::new(amount.round_dp(2)).ok()
}

impl SaveProduct {
    fn validate(self) -> Result<(Option<ProductId>, NewProduct)> {
        let id = match self.id.as_ref() {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                text(Some(v))
                    .and_then(|s| s.trim().parse().ok())
                    .ok_or_else(not_found)?,
            ),
        };
        let name = text(self.name.as_ref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| bad_request("Name is required"))?
            .to_owned();
        let price = parse_price(self.price.as_ref())
            .ok_or_else(|| bad_request("Price must be a non-negative number"))?;
        let image_url = text(self.image_url.as_ref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Ok((
            id,
            NewProduct {
                name,
                price,
                available: self.available.as_ref().and_then(Value::as_bool).unwrap_or(true),
                image_url,
            },
        ))
    }
}

/// List products.
///
/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let include_unavailable = query.include_unavailable.as_deref() == Some("true");
    let products = state.store().list_products(include_unavailable).await?;
    Ok(Json(products))
}

/// Create a product, or update one the caller owns.
///
/// POST /api/products
pub async fn save(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Bytes,
) -> Result<Json<Product>> {
    let body: SaveProduct =
        parse_body(&body).ok_or_else(|| bad_request("Name is required"))?;
    let (id, product) = body.validate()?;

    let saved = match id {
        Some(id) => {
            let updated = state
                .store()
                .update_product(id, admin.id, product)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => not_found(),
                    other => other.into(),
                })?;
            tracing::info!(product_id = %updated.id, admin_id = %admin.id, "Product updated");
            updated
        }
        None => {
            let created = state.store().create_product(admin.id, product).await?;
            tracing::info!(product_id = %created.id, admin_id = %admin.id, "Product created");
            created
        }
    };

    Ok(Json(saved))
}

/// Delete a product the caller owns. Its consumptions go with it.
///
/// DELETE /api/products?id=
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Success>> {
    let raw = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request("Product ID required"))?;
    let id: ProductId = raw.parse().map_err(|_| not_found())?;

    if !state.store().delete_product(id, admin.id).await? {
        return Err(not_found());
    }
    tracing::info!(product_id = %id, admin_id = %admin.id, "Product deleted");
    Ok(Success::ok())
}
