//! End-to-end ledger scenarios over real HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::StatusCode;
use reqwest::header::{LOCATION, SET_COOKIE};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use cantina_integration_tests::{TestServer, get_json};

#[tokio::test]
async fn test_new_user_cannot_read_profit() {
    let server = TestServer::start().await;
    let buyer = server.register("test@x.com", "Silva").await;

    let resp = buyer
        .get(server.url("/api/admin/profit"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");

    let again = server.login("silva", "pw123456").await;
    let resp = again.get(server.url("/dashboard")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profit_follows_current_price() {
    let server = TestServer::start().await;
    let (admin, admin_user) = server.admin("boss@x.com", "Chefe").await;
    let buyer = server.register("buyer@x.com", "Silva").await;
    let refri = server.product(&admin_user, "Refri", Decimal::from(5)).await;

    let resp = buyer
        .post(server.url("/api/consumptions"))
        .json(&json!({ "productId": refri.id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let profit = get_json(&admin, server.url("/api/admin/profit")).await;
    assert_eq!(profit, json!({ "totalProfit": 10.0, "totalQuantitySold": 2 }));

    let resp = admin
        .post(server.url("/api/products"))
        .json(&json!({ "id": refri.id, "name": "Refri", "price": 6, "available": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let profit = get_json(&admin, server.url("/api/admin/profit")).await;
    assert_eq!(profit["totalProfit"], json!(12.0));

    let ledger = get_json(&buyer, server.url("/api/consumptions")).await;
    assert_eq!(ledger["totalOwed"], json!(12.0));
}

#[tokio::test]
async fn test_admins_only_see_their_products() {
    let server = TestServer::start().await;
    let (a, a_user) = server.admin("a@x.com", "Alfa").await;
    let (b, b_user) = server.admin("b@x.com", "Bravo").await;
    let buyer = server.register("buyer@x.com", "Silva").await;

    let cafe_a = server.product(&a_user, "Cafe", Decimal::from(2)).await;
    let cafe_b = server.product(&b_user, "Cafe", Decimal::from(3)).await;

    for (product, quantity) in [(&cafe_a, 1), (&cafe_b, 4)] {
        let resp = buyer
            .post(server.url("/api/consumptions"))
            .json(&json!({ "productId": product.id, "quantity": quantity }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let sold_a = get_json(&a, server.url("/api/admin/products-sold")).await;
    assert_eq!(sold_a.as_array().unwrap().len(), 1);
    assert_eq!(sold_a[0]["totalQuantity"], 1);
    assert_eq!(sold_a[0]["totalProfit"], json!(2.0));

    let profit_b = get_json(&b, server.url("/api/admin/profit")).await;
    assert_eq!(profit_b["totalProfit"], json!(12.0));

    // A clears the buyer, including the row on B's product.
    let buyer_id = get_json(&a, server.url("/api/admin/users")).await[0]["user"]["id"].clone();
    let resp = a
        .post(server.url("/api/admin/consumptions"))
        .json(&json!({ "userId": buyer_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ledger = get_json(&buyer, server.url("/api/consumptions")).await;
    assert_eq!(ledger["consumptions"], json!([]));
    assert_eq!(ledger["totalOwed"], json!(0.0));

    let profit_b = get_json(&b, server.url("/api/admin/profit")).await;
    assert_eq!(profit_b["totalProfit"], json!(0.0));
}

#[tokio::test]
async fn test_guest_login_is_idempotent() {
    let server = TestServer::start().await;
    let (_admin, admin_user) = server.admin("boss@x.com", "Chefe").await;
    for (name, price) in [("Cafe", 2), ("Bolo", 7), ("Refri", 5), ("Suco", 6)] {
        server
            .product(&admin_user, name, Decimal::from(price))
            .await;
    }

    let mut ids = Vec::new();
    for _ in 0..2 {
        let client = TestServer::client();
        let resp = client
            .post(server.url("/api/auth/guest"))
            .json(&json!({ "type": "client" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["user"]["email"], "guest@example.com");
        ids.push(body["user"]["id"].clone());

        let ledger = get_json(&client, server.url("/api/consumptions")).await;
        assert_eq!(ledger["consumptions"].as_array().unwrap().len(), 3);
    }
    assert_eq!(ids[0], ids[1]);

    let client = TestServer::client();
    let resp = client
        .post(server.url("/api/auth/guest"))
        .json(&json!({ "type": "admin" }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["isAdmin"], true);
    let resp = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(resp.headers()[LOCATION], "/admin");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let server = TestServer::start().await;
    let client = server.register("u@x.com", "Silva").await;

    let resp = client
        .get(server.url("/api/consumptions"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(server.url("/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[SET_COOKIE].to_str().unwrap().to_owned();
    assert!(cookie.contains("Max-Age=0"));

    let resp = client
        .get(server.url("/api/consumptions"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client.get(server.url("/dashboard")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/login");
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::start().await;
    let client = TestServer::client();

    let resp = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = client.get(server.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
