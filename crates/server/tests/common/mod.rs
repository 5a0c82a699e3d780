#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use rust_decimal::Decimal;
use tower::ServiceExt;

use cantina_core::{Email, Price};
use cantina_server::config::ServerConfig;
use cantina_server::db::{MemoryStore, Store};
use cantina_server::models::{NewProduct, NewUser, Product, User};
use cantina_server::services::session::{SessionCodec, StatelessSessions};
use cantina_server::{AppState, build_router};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub codec: SessionCodec,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_store(store.clone(), store)
    }

    pub fn with_store(store: Arc<dyn Store>, memory: Arc<MemoryStore>) -> Self {
        let config = ServerConfig::default();
        let codec = SessionCodec::new(config.cookie_name.clone(), false);
        let state = AppState::new(config, store, Arc::new(StatelessSessions));
        Self {
            router: build_router(state),
            store: memory,
            codec,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn user(&self, email: &str, is_admin: bool) -> User {
        self.store
            .create_user(NewUser {
                email: Email::parse(email).unwrap(),
                war_name: email.split('@').next().unwrap().to_owned(),
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

    pub async fn product(&self, owner: &User, name: &str, price: Decimal) -> Product {
        self.store
            .create_product(
                owner.id,
                NewProduct {
                    name: name.to_owned(),
                    price: Price::new(price).unwrap(),
                    available: true,
                    image_url: None,
                },
            )
            .await
            .unwrap()
    }

    pub fn cookie_for(&self, user: &User) -> String {
        let (token, _) = self.codec.create(user).unwrap();
        format!("{}={token}", self.codec.cookie_name())
    }
}

pub fn json_request(
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    raw_request(method, uri, cookie, body.to_string())
}

pub fn raw_request(method: &str, uri: &str, cookie: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie")
        .to_str()
        .unwrap()
        .to_owned()
}
