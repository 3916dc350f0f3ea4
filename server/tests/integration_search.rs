use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use opsrank_core::Bm25Params;
use opsrank_server::{router, AppState};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "s3cret";

fn write_runbooks(dir: &Path) {
    fs::write(
        dir.join("runbook_001.md"),
        "---\ntitle: Database Connection Failure\nlast_reviewed: 2024-01-15\n---\n\ndatabase timeout error",
    )
    .unwrap();
    fs::write(dir.join("runbook_002.md"), "---\ntitle: High CPU Usage\n---\n\ncpu usage high").unwrap();
    fs::write(
        dir.join("runbook_003.md"),
        "---\ntitle: Connection Retry\n---\n\ndatabase connection timeout retry",
    )
    .unwrap();
}

fn state_for(dir: &Path) -> AppState {
    AppState::new(dir, Bm25Params::default(), Some(TOKEN.to_string()))
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn reload(token: Option<&str>) -> Request<Body> {
    let mut req = Request::post("/admin/reload");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    req.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    write_runbooks(dir.path());
    let state = state_for(dir.path());
    state.reload().unwrap();

    let (status, json) = call(router(state), get("/search?q=database%20timeout&k=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_docs"], 3);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    let ids: Vec<u64> = arr.iter().map(|h| h["doc_id"].as_u64().unwrap()).collect();
    assert!(ids.contains(&0) && ids.contains(&2), "{ids:?}");
    assert!(arr[0]["snippet"].as_str().unwrap().contains("<em>database</em>"));
}

#[tokio::test]
async fn search_before_index_is_unavailable() {
    let dir = tempdir().unwrap();
    let (status, _) = call(router(state_for(dir.path())), get("/search?q=cpu")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn reload_publishes_new_corpus() {
    let dir = tempdir().unwrap();
    let state = state_for(dir.path());
    let app = router(state);

    let (status, _) = call(app.clone(), reload(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    write_runbooks(dir.path());
    let (status, json) = call(app.clone(), reload(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["doc_count"], 3);

    let (status, json) = call(app, get("/search?q=cpu&k=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["title"], "High CPU Usage");
}

#[tokio::test]
async fn reload_requires_admin_token() {
    let dir = tempdir().unwrap();
    write_runbooks(dir.path());
    let app = router(state_for(dir.path()));
    let (status, _) = call(app.clone(), reload(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = call(app, reload(Some("wrong"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doc_lookup() {
    let dir = tempdir().unwrap();
    write_runbooks(dir.path());
    let state = state_for(dir.path());
    state.reload().unwrap();
    let app = router(state);

    let (status, json) = call(app.clone(), get("/doc/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metadata"]["title"], "High CPU Usage");
    assert_eq!(json["text"], "cpu usage high");

    let (status, _) = call(app, get("/doc/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempdir().unwrap();
    let (status, body) = call(router(state_for(dir.path())), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn reloads_wait_for_the_one_in_flight() {
    let dir = tempdir().unwrap();
    write_runbooks(dir.path());
    let state = state_for(dir.path());
    let app = router(state.clone());

    let in_flight = state.reload_lock.lock().await;
    let pending = tokio::spawn(call(app, reload(Some(TOKEN))));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!pending.is_finished());
    assert!(!state.retriever.is_built());

    drop(in_flight);
    let (status, json) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["doc_count"], 3);
}
