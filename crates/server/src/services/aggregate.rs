//! Profit aggregation.
//!
//! Pure functions over ledger entries as loaded from the store. Nothing is
//! cached: every call reflects current prices and every current row.
//!
//! Each function filters by the product's owning admin itself, so a row can
//! only ever count toward the admin who owns its product, whatever the
//! caller passed in.
//!
//! Money sums use checked arithmetic and fail with [`TotalOverflow`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use cantina_core::{ProductId, UserId};

use crate::models::{LedgerEntry, Product, PublicUser, User};

/// Sales of one product.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product: Product,
    pub total_quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_profit: Decimal,
}

/// Totals over all of an admin's products.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_profit: Decimal,
    pub total_quantity_sold: i64,
}

/// What one buyer owes one admin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDebt {
    pub user: PublicUser,
    pub total_quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_owed: Decimal,
    pub consumptions: Vec<LedgerEntry>,
}

/// A money total left the `Decimal` range.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("ledger total overflowed")]
pub struct TotalOverflow;

fn line_total(entry: &LedgerEntry) -> Result<Decimal, TotalOverflow> {
    entry.line_total().ok_or(TotalOverflow)
}

fn add(acc: Decimal, entry: &LedgerEntry) -> Result<Decimal, TotalOverflow> {
    acc.checked_add(line_total(entry)?).ok_or(TotalOverflow)
}

fn owned_by(admin: UserId) -> impl Fn(&&LedgerEntry) -> bool {
    move |e| e.product.admin_id == Some(admin)
}

fn quantity(entry: &LedgerEntry) -> i64 {
    i64::from(entry.consumption.quantity.get())
}

/// Per-product totals for `admin`, highest profit first.
///
/// Ties keep the order in which products first appear in `entries`.
///
/// # Errors
///
/// Returns `TotalOverflow` if a product's profit leaves the `Decimal` range.
pub fn products_sold(
    entries: &[LedgerEntry],
    admin: UserId,
) -> Result<Vec<ProductSales>, TotalOverflow> {
    let mut index: HashMap<ProductId, usize> = HashMap::new();
    let mut sales: Vec<ProductSales> = Vec::new();

    for entry in entries.iter().filter(owned_by(admin)) {
        let slot = *index.entry(entry.product.id).or_insert_with(|| {
            sales.push(ProductSales {
                product: entry.product.clone(),
                total_quantity: 0,
                total_profit: Decimal::ZERO,
            });
            sales.len() - 1
        });
        if let Some(s) = sales.get_mut(slot) {
            s.total_quantity += quantity(entry);
            s.total_profit = add(s.total_profit, entry)?;
        }
    }

    // `sort_by` is stable, so equal profits stay in first-seen order.
    sales.sort_by(|a, b| b.total_profit.cmp(&a.total_profit));
    Ok(sales)
}

/// Total quantity sold and profit for `admin`.
///
/// # Errors
///
/// Returns `TotalOverflow` if the profit leaves the `Decimal` range.
pub fn profit_summary(
    entries: &[LedgerEntry],
    admin: UserId,
) -> Result<ProfitSummary, TotalOverflow> {
    entries
        .iter()
        .filter(owned_by(admin))
        .try_fold(ProfitSummary::default(), |acc, e| {
            Ok(ProfitSummary {
                total_profit: add(acc.total_profit, e)?,
                total_quantity_sold: acc.total_quantity_sold + quantity(e),
            })
        })
}

/// Σ quantity × current price.
///
/// # Errors
///
/// Returns `TotalOverflow` if the sum leaves the `Decimal` range.
pub fn total_owed(entries: &[LedgerEntry]) -> Result<Decimal, TotalOverflow> {
    entries.iter().try_fold(Decimal::ZERO, add)
}

/// Debts per buyer on `admin`'s products, largest first.
///
/// Buyers missing from `users` are skipped.
///
/// # Errors
///
/// Returns `TotalOverflow` if a buyer's debt leaves the `Decimal` range.
pub fn debts_by_user(
    entries: &[LedgerEntry],
    users: &[User],
    admin: UserId,
) -> Result<Vec<UserDebt>, TotalOverflow> {
    let mut grouped: Vec<(UserId, Vec<LedgerEntry>)> = Vec::new();
    for entry in entries.iter().filter(owned_by(admin)) {
        let buyer = entry.consumption.user_id;
        match grouped.iter_mut().find(|(id, _)| *id == buyer) {
            Some((_, rows)) => rows.push(entry.clone()),
            None => grouped.push((buyer, vec![entry.clone()])),
        }
    }

    let mut debts = Vec::with_capacity(grouped.len());
    for (buyer, consumptions) in grouped {
        let Some(user) = users.iter().find(|u| u.id == buyer) else {
            continue;
        };
        debts.push(UserDebt {
            user: user.public(),
            total_quantity: consumptions.iter().map(quantity).sum(),
            total_owed: total_owed(&consumptions)?,
            consumptions,
        });
    }
    debts.sort_by(|a, b| b.total_owed.cmp(&a.total_owed));
    Ok(debts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use cantina_core::{ConsumptionId, Email, Price, Quantity};

    use super::*;
    use crate::models::Consumption;

    fn product(name: &str, price: i64, admin: UserId) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_owned(),
            price: Price::new(Decimal::from(price)).unwrap(),
            available: true,
            image_url: None,
            admin_id: Some(admin),
            created_at: Utc::now(),
        }
    }

    fn entry(user: UserId, product: &Product, qty: i64) -> LedgerEntry {
        LedgerEntry {
            consumption: Consumption {
                id: ConsumptionId::new(),
                user_id: user,
                product_id: product.id,
                quantity: Quantity::new(qty).unwrap(),
                created_at: Utc::now(),
            },
            product: product.clone(),
        }
    }

    fn buyer(id: UserId, name: &str) -> User {
        User {
            id,
            email: Email::parse(&format!("{name}@x.com")).unwrap(),
            war_name: name.to_owned(),
            rank: "Sd".to_owned(),
            company: "A".to_owned(),
            phone: "1".to_owned(),
            is_admin: false,
            password_hash: None,
            pix_key: None,
            qr_code_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_products_sold_sorted_and_consistent_with_summary() {
        let admin = UserId::new();
        let u = UserId::new();
        let cafe = product("Cafe", 2, admin);
        let refri = product("Refri", 5, admin);
        let bolo = product("Bolo", 3, admin);
        let entries = vec![
            entry(u, &cafe, 1),
            entry(u, &refri, 2),
            entry(u, &bolo, 1),
            entry(u, &cafe, 2),
        ];

        let sold = products_sold(&entries, admin).unwrap();
        let profits: Vec<Decimal> = sold.iter().map(|s| s.total_profit).collect();
        assert_eq!(
            profits,
            vec![Decimal::from(10), Decimal::from(6), Decimal::from(3)]
        );
        assert_eq!(sold[1].product.id, cafe.id);
        assert_eq!(sold[1].total_quantity, 3);

        let summary = profit_summary(&entries, admin).unwrap();
        let sum: Decimal = sold.iter().map(|s| s.total_profit).sum();
        assert_eq!(summary.total_profit, sum);
        assert_eq!(summary.total_quantity_sold, 6);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let admin = UserId::new();
        let u = UserId::new();
        let first = product("A", 2, admin);
        let second = product("B", 1, admin);
        let entries = vec![entry(u, &first, 1), entry(u, &second, 2)];

        let sold = products_sold(&entries, admin).unwrap();
        assert_eq!(sold[0].product.id, first.id);
        assert_eq!(sold[1].product.id, second.id);
    }

    #[test]
    fn test_tenancy_with_colliding_names() {
        let a = UserId::new();
        let b = UserId::new();
        let u = UserId::new();
        let cafe_a = product("Cafe", 2, a);
        let cafe_b = product("Cafe", 2, b);
        let entries = vec![entry(u, &cafe_a, 1), entry(u, &cafe_b, 4)];

        let sold_a = products_sold(&entries, a).unwrap();
        assert_eq!(sold_a.len(), 1);
        assert_eq!(sold_a[0].product.id, cafe_a.id);
        assert_eq!(profit_summary(&entries, a).unwrap().total_profit, Decimal::from(2));
        assert_eq!(profit_summary(&entries, b).unwrap().total_profit, Decimal::from(8));
    }

    #[test]
    fn test_empty_ledger() {
        let admin = UserId::new();
        assert!(products_sold(&[], admin).unwrap().is_empty());
        assert_eq!(profit_summary(&[], admin), Ok(ProfitSummary::default()));
        assert_eq!(total_owed(&[]), Ok(Decimal::ZERO));
    }

    #[test]
    fn test_debts_by_user() {
        let admin = UserId::new();
        let (u1, u2) = (UserId::new(), UserId::new());
        let cafe = product("Cafe", 2, admin);
        let entries = vec![entry(u1, &cafe, 1), entry(u2, &cafe, 3), entry(u1, &cafe, 1)];
        let users = vec![buyer(u1, "um"), buyer(u2, "dois")];

        let debts = debts_by_user(&entries, &users, admin).unwrap();
        assert_eq!(debts.len(), 2);
        assert_eq!(debts[0].user.id, u2);
        assert_eq!(debts[0].total_owed, Decimal::from(6));
        assert_eq!(debts[1].consumptions.len(), 2);
        assert_eq!(debts[1].total_quantity, 2);
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let admin = UserId::new();
        let mut ouro = product("Ouro", 1, admin);
        ouro.price = Price::MAX;
        let row = entry(UserId::new(), &ouro, i64::from(i32::MAX));

        let line = row.line_total().unwrap();
        assert_eq!(add(Decimal::ZERO, &row), Ok(line));
        assert_eq!(add(Decimal::MAX, &row), Err(TotalOverflow));
    }

    #[test]
    fn test_serializes_numbers() {
        let summary = ProfitSummary {
            total_profit: Decimal::new(125, 1),
            total_quantity_sold: 3,
        };
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["totalProfit"], serde_json::json!(12.5));
        assert_eq!(json["totalQuantitySold"], serde_json::json!(3));
    }
}
