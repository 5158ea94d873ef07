use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use bookmyfield::proxy::{router, ProxyState, ALLOW_HEADERS, ALLOW_METHODS, ALLOW_ORIGIN};

struct Guard(JoinHandle<()>);
impl Drop for Guard { fn drop(&mut self) { self.0.abort(); } }

async fn serve(app: Router) -> (Guard, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server task error: {e:?}"); }
    });
    (Guard(handle), addr)
}

/// Upstream stub: echoes what it received and counts every hit.
async fn echo(State(hits): State<Arc<AtomicUsize>>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    hits.fetch_add(1, Ordering::SeqCst);
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let status = if method == Method::POST { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "authorization": header("authorization"),
        "content_type": header("content-type"),
        "body": String::from_utf8_lossy(&body),
    })))
}

fn upstream_app(hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route("/api/v1/plain", get(|| async { ([("content-type", "text/plain; charset=utf-8")], "pong") }))
        .route("/api/v1/empty", get(|| async { StatusCode::NO_CONTENT }))
        .route("/api/v1/broken", get(|| async { ([("content-type", "application/json")], "{\"unterminated\": ") }))
        .route("/api/v1/gone", get(|| async { (StatusCode::NOT_FOUND, Json(json!({"error": "Field not found"}))) }))
        .route("/api/v1/{*rest}", any(echo))
        .with_state(hits)
}

async fn start_pair() -> (Guard, Guard, SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let (up_guard, up_addr) = serve(upstream_app(hits.clone())).await;
    let state = ProxyState::new(&format!("http://{}/api/v1", up_addr), Duration::from_secs(5)).expect("proxy state");
    let (proxy_guard, proxy_addr) = serve(router(state)).await;
    (up_guard, proxy_guard, proxy_addr, hits)
}

fn assert_cors(resp: &reqwest::Response) {
    let h = resp.headers();
    assert_eq!(h.get("access-control-allow-origin").unwrap(), ALLOW_ORIGIN);
    assert_eq!(h.get("access-control-allow-methods").unwrap(), ALLOW_METHODS);
    assert_eq!(h.get("access-control-allow-headers").unwrap(), ALLOW_HEADERS);
}

#[tokio::test]
async fn get_forwards_path_query_and_authorization() {
    let (_u, _p, addr, hits) = start_pair().await;
    let resp = reqwest::Client::new()
        .get(format!("http://{}/api/proxy/fields?location=Jakarta", addr))
        .bearer_auth("tok-1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_cors(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["method"], "GET");
    assert_eq!(body["uri"], "/api/v1/fields?location=Jakarta");
    assert_eq!(body["authorization"], "Bearer tok-1");
    assert_eq!(body["content_type"], "application/json");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn post_forwards_body_and_status() {
    let (_u, _p, addr, _hits) = start_pair().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/proxy/bookings", addr))
        .json(&json!({"field_id": "f1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    assert_cors(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["authorization"], Value::Null);
    let forwarded: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
    assert_eq!(forwarded, json!({"field_id": "f1"}));
}

#[tokio::test]
async fn delete_is_forwarded_without_body() {
    let (_u, _p, addr, _hits) = start_pair().await;
    let resp = reqwest::Client::new()
        .delete(format!("http://{}/api/proxy/fields/admin/42", addr))
        .body("ignored")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["method"], "DELETE");
    assert_eq!(body["uri"], "/api/v1/fields/admin/42");
    assert_eq!(body["body"], "");
}

#[tokio::test]
async fn upstream_error_status_is_preserved() {
    let (_u, _p, addr, _hits) = start_pair().await;
    let resp = reqwest::get(format!("http://{}/api/proxy/gone", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    assert_cors(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"error": "Field not found"}));
}

#[tokio::test]
async fn preflight_is_answered_locally() {
    let (_u, _p, addr, hits) = start_pair().await;
    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("http://{}/api/proxy/bookings", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_cors(&resp);
    assert!(resp.bytes().await.unwrap().is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_json_and_empty_bodies_pass_through() {
    let (_u, _p, addr, _hits) = start_pair().await;
    let resp = reqwest::get(format!("http://{}/api/proxy/plain", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_cors(&resp);
    assert!(resp.headers().get("content-type").unwrap().to_str().unwrap().starts_with("text/plain"));
    assert_eq!(resp.text().await.unwrap(), "pong");

    let resp = reqwest::get(format!("http://{}/api/proxy/empty", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);
    assert_cors(&resp);
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let (_u, _p, addr, hits) = start_pair().await;
    let resp = reqwest::Client::new()
        .patch(format!("http://{}/api/proxy/fields", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
    assert_cors(&resp);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_upstream_becomes_structured_500() {
    let closed = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("bind 127.0.0.1:0");
    let dead = closed.local_addr().unwrap();
    drop(closed);
    let state = ProxyState::new(&format!("http://{}/api/v1", dead), Duration::from_secs(2)).unwrap();
    let (_p, addr) = serve(router(state)).await;

    let resp = reqwest::get(format!("http://{}/api/proxy/fields", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Proxy request failed");
    assert!(!body["details"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn put_forwards_body() {
    let (_u, _p, addr, _hits) = start_pair().await;
    let resp = reqwest::Client::new()
        .put(format!("http://{}/api/proxy/fields/admin/42", addr))
        .bearer_auth("admin-tok")
        .json(&json!({"name": "Lapangan C", "price": 120000}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_cors(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["method"], "PUT");
    assert_eq!(body["uri"], "/api/v1/fields/admin/42");
    assert_eq!(body["authorization"], "Bearer admin-tok");
    let forwarded: Value = serde_json::from_str(body["body"].as_str().unwrap()).unwrap();
    assert_eq!(forwarded, json!({"name": "Lapangan C", "price": 120000}));
}

#[tokio::test]
async fn invalid_upstream_json_becomes_structured_500() {
    let (_u, _p, addr, hits) = start_pair().await;
    let resp = reqwest::get(format!("http://{}/api/proxy/broken", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors(&resp);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Proxy request failed");
    assert!(body["details"].as_str().unwrap().starts_with("invalid JSON from upstream"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
