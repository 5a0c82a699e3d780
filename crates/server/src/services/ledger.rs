//! Consumption ledger.
//!
//! Records and deletes purchase events. Every write is a single independent
//! row; a multi-item cart is several `record` calls. Totals are recomputed
//! from current prices on every read.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use cantina_core::{ConsumptionId, ProductId, Quantity, QuantityError, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::LedgerEntry;
use crate::services::aggregate::{self, TotalOverflow};

/// Errors that can occur while recording or deleting consumptions.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid quantity: {0}")]
    InvalidQuantity(#[from] QuantityError),

    #[error("product not found")]
    ProductNotFound,

    #[error("product unavailable")]
    ProductUnavailable,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Overflow(#[from] TotalOverflow),
}

impl LedgerError {
    /// Message returned to the client.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "Quantity must be a positive integer",
            Self::ProductNotFound => "Product not found",
            Self::ProductUnavailable => "Product unavailable",
            Self::Repository(_) | Self::Overflow(_) => "Internal server error",
        }
    }
}

/// A user's rows and what they owe right now.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLedger {
    pub consumptions: Vec<LedgerEntry>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_owed: Decimal,
    pub item_count: i64,
}

/// Ledger operations over any [`Store`].
pub struct Ledger<'a> {
    store: &'a dyn Store,
}

impl<'a> Ledger<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Record one purchase for `user`.
    ///
    /// `quantity` is the raw JSON value so that fractional, string and
    /// missing quantities are all rejected the same way. The quantity is
    /// checked before the product, so a missing `product` with a bad
    /// quantity is still an invalid quantity.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidQuantity` unless `quantity` is an integer `>= 1`.
    /// Returns `LedgerError::ProductNotFound` / `ProductUnavailable` for bad products.
    pub async fn record(
        &self,
        user: UserId,
        product: Option<ProductId>,
        quantity: &serde_json::Value,
    ) -> Result<LedgerEntry, LedgerError> {
        let quantity = Quantity::from_json(quantity)?;

        let product = product.ok_or(LedgerError::ProductNotFound)?;
        let product = self
            .store
            .get_product(product)
            .await?
            .ok_or(LedgerError::ProductNotFound)?;
        if !product.available {
            return Err(LedgerError::ProductUnavailable);
        }

        let consumption = self
            .store
            .create_consumption(user, product.id, quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => LedgerError::ProductNotFound,
                other => LedgerError::Repository(other),
            })?;

        tracing::info!(
            user_id = %user,
            product_id = %product.id,
            quantity = quantity.get(),
            "Consumption recorded"
        );

        Ok(LedgerEntry {
            consumption,
            product,
        })
    }

    /// Delete one consumption by id. A missing id is a no-op.
    ///
    /// `admin` is only recorded in the log.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Repository` if the store fails.
    pub async fn delete(&self, admin: UserId, id: ConsumptionId) -> Result<(), LedgerError> {
        let deleted = self.store.delete_consumption(id).await?;
        if deleted == 0 {
            tracing::debug!(admin_id = %admin, consumption_id = %id, "Delete matched no row");
        } else {
            tracing::info!(admin_id = %admin, consumption_id = %id, "Consumption deleted");
        }
        Ok(())
    }

    /// Delete every row of `user`, whichever admin owns the product.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Repository` if the store fails.
    pub async fn clear_all_for_user(&self, admin: UserId, user: UserId) -> Result<u64, LedgerError> {
        let deleted = self.store.delete_consumptions_for_user(user).await?;
        tracing::info!(admin_id = %admin, user_id = %user, deleted, "Consumptions cleared");
        Ok(deleted)
    }

    /// The caller's rows with the total owed at current prices.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Repository` if the store fails and
    /// `LedgerError::Overflow` if the total leaves the `Decimal` range.
    pub async fn for_user(&self, user: UserId) -> Result<UserLedger, LedgerError> {
        let consumptions = self.store.list_consumptions_for_user(user).await?;
        let total_owed = aggregate::total_owed(&consumptions)?;
        let item_count = consumptions
            .iter()
            .map(|e| i64::from(e.consumption.quantity.get()))
            .sum();
        Ok(UserLedger {
            consumptions,
            total_owed,
            item_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use cantina_core::{Email, Price};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewProduct, NewUser, User};

    async fn user(store: &MemoryStore, email: &str, is_admin: bool) -> User {
        store
            .create_user(NewUser {
                email: Email::parse(email).unwrap(),
                war_name: email.to_owned(),
                rank: "Cb".to_owned(),
                company: "A".to_owned(),
                phone: "1".to_owned(),
                is_admin,
                password_hash: None,
                pix_key: None,
            })
            .await
            .unwrap()
    }

    fn product(price: Decimal, available: bool) -> NewProduct {
        NewProduct {
            name: "Refri".to_owned(),
            price: Price::new(price).unwrap(),
            available,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_record_rejects_bad_quantities() {
        let store = MemoryStore::new();
        let admin = user(&store, "adm@x.com", true).await;
        let buyer = user(&store, "u@x.com", false).await;
        let p = store
            .create_product(admin.id, product(Decimal::from(5), true))
            .await
            .unwrap();
        let ledger = Ledger::new(&store);

        for bad in [json!(0), json!(-1), json!(1.5), json!("2"), json!(null)] {
            assert!(matches!(
                ledger.record(buyer.id, Some(p.id), &bad).await,
                Err(LedgerError::InvalidQuantity(_))
            ));
        }
        assert!(matches!(
            ledger.record(buyer.id, None, &json!(0)).await,
            Err(LedgerError::InvalidQuantity(_))
        ));
        assert!(ledger.for_user(buyer.id).await.unwrap().consumptions.is_empty());
    }

    #[tokio::test]
    async fn test_record_unknown_or_unavailable_product() {
        let store = MemoryStore::new();
        let admin = user(&store, "adm@x.com", true).await;
        let buyer = user(&store, "u@x.com", false).await;
        let hidden = store
            .create_product(admin.id, product(Decimal::from(5), false))
            .await
            .unwrap();
        let ledger = Ledger::new(&store);

        assert!(matches!(
            ledger.record(buyer.id, Some(ProductId::new()), &json!(1)).await,
            Err(LedgerError::ProductNotFound)
        ));
        assert!(matches!(
            ledger.record(buyer.id, None, &json!(1)).await,
            Err(LedgerError::ProductNotFound)
        ));
        assert!(matches!(
            ledger.record(buyer.id, Some(hidden.id), &json!(1)).await,
            Err(LedgerError::ProductUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_total_owed_follows_current_price() {
        let store = MemoryStore::new();
        let admin = user(&store, "adm@x.com", true).await;
        let buyer = user(&store, "u@x.com", false).await;
        let p = store
            .create_product(admin.id, product(Decimal::new(50, 1), true))
            .await
            .unwrap();
        let ledger = Ledger::new(&store);

        ledger.record(buyer.id, Some(p.id), &json!(2)).await.unwrap();
        let before = ledger.for_user(buyer.id).await.unwrap();
        assert_eq!(before.total_owed, Decimal::new(100, 1));
        assert_eq!(before.item_count, 2);

        store
            .update_product(p.id, admin.id, product(Decimal::new(60, 1), true))
            .await
            .unwrap();
        let after = ledger.for_user(buyer.id).await.unwrap();
        assert_eq!(after.total_owed, Decimal::new(120, 1));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop_and_clear_takes_every_row() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com", true).await;
        let b = user(&store, "b@x.com", true).await;
        let buyer = user(&store, "u@x.com", false).await;
        let pa = store
            .create_product(a.id, product(Decimal::from(1), true))
            .await
            .unwrap();
        let pb = store
            .create_product(b.id, product(Decimal::from(1), true))
            .await
            .unwrap();
        let ledger = Ledger::new(&store);
        ledger.record(buyer.id, Some(pa.id), &json!(1)).await.unwrap();
        ledger.record(buyer.id, Some(pb.id), &json!(1)).await.unwrap();

        ledger.delete(a.id, ConsumptionId::new()).await.unwrap();
        assert_eq!(ledger.for_user(buyer.id).await.unwrap().consumptions.len(), 2);

        // A's clear also removes the row on B's product.
        assert_eq!(ledger.clear_all_for_user(a.id, buyer.id).await.unwrap(), 2);
        assert!(ledger.for_user(buyer.id).await.unwrap().consumptions.is_empty());
    }

    #[tokio::test]
    async fn test_delete_ignores_product_owner() {
        let store = MemoryStore::new();
        let a = user(&store, "a@x.com", true).await;
        let b = user(&store, "b@x.com", true).await;
        let buyer = user(&store, "u@x.com", false).await;
        let pb = store
            .create_product(b.id, product(Decimal::from(1), true))
            .await
            .unwrap();
        let ledger = Ledger::new(&store);
        let row = ledger.record(buyer.id, Some(pb.id), &json!(1)).await.unwrap();

        ledger.delete(a.id, row.consumption.id).await.unwrap();
        assert!(ledger.for_user(buyer.id).await.unwrap().consumptions.is_empty());
    }
}
