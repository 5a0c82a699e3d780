//! Product domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cantina_core::{Price, ProductId, UserId};

/// A product sold in the canteen.
///
/// Profit is always computed against the current `price`; there is no
/// price history.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub available: bool,
    pub image_url: Option<String>,
    /// Admin who collects payment for this product.
    pub admin_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Whether `admin` may edit or delete this product.
    ///
    /// Unowned products can be claimed by any admin.
    #[must_use]
    pub fn editable_by(&self, admin: UserId) -> bool {
        self.admin_id.is_none_or(|owner| owner == admin)
    }
}

/// Validated fields for creating or updating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub available: bool,
    pub image_url: Option<String>,
}
