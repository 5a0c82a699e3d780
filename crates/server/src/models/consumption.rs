//! Consumption (ledger row) types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cantina_core::{ConsumptionId, ProductId, Quantity, UserId};

use super::Product;

/// One purchase event: `user_id` took `quantity` units of `product_id`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub id: ConsumptionId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
}

/// A consumption joined with its product as it is *now*.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub consumption: Consumption,
    pub product: Product,
}

impl LedgerEntry {
    /// `quantity × current price`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<rust_decimal::Decimal> {
        self.product.price.line_total(self.consumption.quantity)
    }
}
