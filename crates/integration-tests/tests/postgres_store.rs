//! `PgStore` against a real database.
//!
//! These tests require a scratch `PostgreSQL` database in
//! `CANTINA_TEST_DATABASE_URL`. Each test works with its own users, so they
//! can share one database.
//!
//! Run with: cargo test -p cantina-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;

use cantina_core::{ConsumptionId, Email, Price, Quantity, UserId};
use cantina_server::db::{self, PgStore, RepositoryError, Store};
use cantina_server::models::{NewProduct, NewUser, User};

async fn pool() -> PgPool {
    let url = std::env::var("CANTINA_TEST_DATABASE_URL")
        .expect("CANTINA_TEST_DATABASE_URL must be set");
    let pool = db::create_pool(&SecretString::from(url))
        .await
        .expect("connect");
    sqlx::migrate!("../server/migrations")
        .run(&pool)
        .await
        .expect("migrate");
    pool
}

async fn user(store: &PgStore, is_admin: bool) -> User {
    let email = format!("{}@test.local", UserId::new());
    store
        .create_user(NewUser {
            email: Email::parse(&email).unwrap(),
            war_name: email.clone(),
            rank: "Cb".to_owned(),
            company: "A".to_owned(),
            phone: "11999999999".to_owned(),
            is_admin,
            password_hash: None,
            pix_key: None,
        })
        .await
        .unwrap()
}

fn product(name: &str, price: i64) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        price: Price::new(Decimal::from(price)).unwrap(),
        available: true,
        image_url: None,
    }
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database"]
async fn test_email_is_unique_ignoring_case() {
    let store = PgStore::new(pool().await);
    let first = user(&store, false).await;

    let upper = Email::parse(&first.email.as_str().to_uppercase()).unwrap();
    let found = store.find_user_by_email(&upper).await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(first.id));

    let dup = store
        .create_user(NewUser {
            email: first.email.clone(),
            war_name: "dup".to_owned(),
            rank: "Cb".to_owned(),
            company: "A".to_owned(),
            phone: "1".to_owned(),
            is_admin: false,
            password_hash: None,
            pix_key: None,
        })
        .await;
    assert!(matches!(dup, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database"]
async fn test_ledger_reads_are_scoped_by_owner() {
    let store = PgStore::new(pool().await);
    let a = user(&store, true).await;
    let b = user(&store, true).await;
    let buyer = user(&store, false).await;

    let cafe_a = store.create_product(a.id, product("Cafe", 2)).await.unwrap();
    let cafe_b = store.create_product(b.id, product("Cafe", 3)).await.unwrap();
    let two = Quantity::new(2).unwrap();
    let row_a = store
        .create_consumption(buyer.id, cafe_a.id, two)
        .await
        .unwrap();
    store
        .create_consumption(buyer.id, cafe_b.id, two)
        .await
        .unwrap();

    let for_a = store.list_consumptions_for_admin(a.id).await.unwrap();
    assert_eq!(for_a.len(), 1);
    assert_eq!(for_a[0].product.id, cafe_a.id);

    // Deletes ignore the product owner; an unknown id is a no-op.
    assert_eq!(store.delete_consumption(row_a.id).await.unwrap(), 1);
    assert_eq!(
        store
            .delete_consumption(ConsumptionId::new())
            .await
            .unwrap(),
        0
    );
    let left = store.list_consumptions_for_user(buyer.id).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].product.id, cafe_b.id);

    // Deleting a product cascades to its rows.
    assert!(store.delete_product(cafe_b.id, b.id).await.unwrap());
    assert!(
        store
            .list_consumptions_for_user(buyer.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database"]
async fn test_clear_takes_rows_on_every_product() {
    let store = PgStore::new(pool().await);
    let a = user(&store, true).await;
    let b = user(&store, true).await;
    let buyer = user(&store, false).await;

    let cafe_a = store.create_product(a.id, product("Cafe", 2)).await.unwrap();
    let cafe_b = store.create_product(b.id, product("Cafe", 3)).await.unwrap();
    let one = Quantity::new(1).unwrap();
    for p in [cafe_a.id, cafe_b.id] {
        store.create_consumption(buyer.id, p, one).await.unwrap();
    }

    assert_eq!(
        store.delete_consumptions_for_user(buyer.id).await.unwrap(),
        2
    );
    assert!(
        store
            .list_consumptions_for_user(buyer.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
#[ignore = "Requires a PostgreSQL database"]
async fn test_update_product_claims_unowned_only() {
    let store = PgStore::new(pool().await);
    let a = user(&store, true).await;
    let b = user(&store, true).await;

    let owned = store.create_product(a.id, product("Bolo", 7)).await.unwrap();
    let err = store
        .update_product(owned.id, b.id, product("Bolo", 8))
        .await;
    assert!(matches!(err, Err(RepositoryError::NotFound)));

    let updated = store
        .update_product(owned.id, a.id, product("Bolo", 8))
        .await
        .unwrap();
    assert_eq!(updated.price.amount(), Decimal::from(8));
}
