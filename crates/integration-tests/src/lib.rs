//! End-to-end tests for Cantina.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process server on an ephemeral port, in-memory store
//! cargo test -p cantina-integration-tests
//!
//! # Also run the Postgres-backed tests
//! CANTINA_TEST_DATABASE_URL=postgres://... cargo test -p cantina-integration-tests -- --ignored
//! ```
//!
//! Every test gets its own [`TestServer`]: the real router, bound to
//! `127.0.0.1:0`, backed by a fresh [`MemoryStore`], shut down when the
//! server handle is dropped.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use reqwest::redirect::Policy;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use cantina_core::Price;
use cantina_server::config::ServerConfig;
use cantina_server::db::{MemoryStore, Store};
use cantina_server::models::{NewProduct, Product, User};
use cantina_server::services::session::StatelessSessions;
use cantina_server::{AppState, build_router};

/// A live server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server backed by an empty in-memory store.
    pub async fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            ServerConfig::default(),
            store.clone(),
            Arc::new(StatelessSessions),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, build_router(state))
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
                .expect("server error");
        });

        Self {
            addr,
            store,
            shutdown: Some(tx),
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A client with its own cookie jar. Redirects are not followed so the
    /// role redirects can be asserted.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Register through the API; the returned client holds the session.
    pub async fn register(&self, email: &str, war_name: &str) -> Client {
        let client = Self::client();
        let resp = client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": "pw123456",
                "warName": war_name,
                "rank": "Cb",
                "company": "A",
                "phone": "11999999999",
            }))
            .send()
            .await
            .expect("register request");
        assert_eq!(resp.status(), 201, "register {email}");
        client
    }

    /// Log in through the API; the returned client holds the session.
    pub async fn login(&self, login: &str, password: &str) -> Client {
        let client = Self::client();
        let resp = client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": login, "password": password }))
            .send()
            .await
            .expect("login request");
        assert_eq!(resp.status(), 200, "login {login}");
        client
    }

    /// Register `email`, promote it directly in the store, and log in again
    /// so the session carries the admin flag.
    pub async fn admin(&self, email: &str, war_name: &str) -> (Client, User) {
        self.register(email, war_name).await;
        let user = self
            .store
            .set_admin(&cantina_core::Email::parse(email).expect("email"), true)
            .await
            .expect("promote");
        (self.login(email, "pw123456").await, user)
    }

    /// Create an available product owned by `owner` directly in the store.
    pub async fn product(&self, owner: &User, name: &str, price: Decimal) -> Product {
        self.store
            .create_product(
                owner.id,
                NewProduct {
                    name: name.to_owned(),
                    price: Price::new(price).expect("price"),
                    available: true,
                    image_url: None,
                },
            )
            .await
            .expect("create product")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// GET `path` and decode the JSON body, asserting a 200.
pub async fn get_json(client: &Client, url: String) -> Value {
    let resp = client.get(url).send().await.expect("GET request");
    assert_eq!(resp.status(), 200);
    resp.json().await.expect("JSON body")
}
