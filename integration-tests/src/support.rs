use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tagdraw::{default_tiers, Comment, MemoryWinnerStore};
use tagdraw_server::api::{self, AppState, ADMIN_HEADER};
use tagdraw_server::storage::{MemStore, Store};
use tagdraw_server::sync::{DemoSource, Source};
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "hunter2";

/// `(id, author, text, verified)`
pub type Seed<'a> = (&'a str, &'a str, &'a str, bool);

pub fn seeded_store(rows: &[Seed<'_>]) -> Store {
    let store: Store = Arc::new(MemStore::default());
    for (id, author, text, verified) in rows {
        store.upsert(Comment::new(*id, *author, *text)).expect("upsert");
        if *verified {
            store.set_verified(id, true).expect("verify");
        }
    }
    store
}

pub fn test_state(store: Store) -> AppState {
    AppState {
        comments: store,
        winners: Arc::new(MemoryWinnerStore::new()),
        source: Arc::new(Source::Demo(DemoSource)),
        tiers: Arc::new(default_tiers()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    }
}

pub fn test_router(rows: &[Seed<'_>]) -> Router {
    api::router(test_state(seeded_store(rows)))
}

/// Ten authors, all eligible; the first four are verified.
pub fn ten_authors() -> Vec<(String, String, String, bool)> {
    (0..10).map(|i| (format!("c{i}"), format!("user{i}"), format!("entry #P {i}"), i < 4)).collect()
}

pub fn as_seeds(rows: &[(String, String, String, bool)]) -> Vec<Seed<'_>> {
    rows.iter().map(|(id, a, t, v)| (id.as_str(), a.as_str(), t.as_str(), *v)).collect()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body bytes").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).expect("request")).await
}

/// `password: None` sends no admin header.
pub async fn admin(router: &Router, method: &str, uri: &str, password: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(pw) = password {
        req = req.header(ADMIN_HEADER, pw);
    }
    let req = match body {
        Some(b) => req.header("content-type", "application/json").body(Body::from(b.to_string())),
        None => req.body(Body::empty()),
    };
    send(router, req.expect("request")).await
}

pub fn winner_authors(body: &Value) -> Vec<String> {
    body["winners"].as_array().expect("winners array").iter().map(|w| w["author"].as_str().unwrap_or_default().to_string()).collect()
}
