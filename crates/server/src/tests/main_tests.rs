use super::*;
use axum::{body, body::Body, http::Request, response::Response};
use serde_json::json;
use storage::MemoryStore;
use tower::ServiceExt;

fn test_app_with_limit(max_body_bytes: usize) -> Router {
    let state = AppState {
        api: ApiContext::new(Arc::new(MemoryStore::new())),
        max_body_bytes,
    };
    build_router(Arc::new(state))
}

fn test_app() -> Router {
    test_app_with_limit(config::DEFAULT_MAX_BODY_BYTES)
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn json_request(method: &str, uri: &str, payload: serde_json::Value) -> Request<Body> {
    let raw = payload.to_string();
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("content-length", raw.len())
        .body(Body::from(raw))
        .expect("request")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn segment_text_route_returns_paragraphs() {
    let request = json_request(
        "POST",
        "/api/segment-text",
        json!({ "text": "Ann: hello\n\nBob: hi\nthere\n" }),
    );
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let reply: SegmentTextResponse = json_body(response).await;
    assert_eq!(reply.segments, vec!["Ann: hello", "Bob: hi\nthere"]);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let app = test_app_with_limit(64);
    let request = json_request(
        "POST",
        "/api/segment-text",
        json!({ "text": "x".repeat(200) }),
    );
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn storage_routes_put_get_list_delete() {
    let app = test_app();

    let put = json_request(
        "PUT",
        "/api/storage/pinned_characters",
        json!(["Ann", "Bob"]),
    );
    let response = app.clone().oneshot(put).await.expect("put");
    assert_eq!(response.status(), StatusCode::OK);
    let stored: StorageEntry = json_body(response).await;
    assert_eq!(stored.value, json!(["Ann", "Bob"]));

    let get = Request::get("/api/storage/pinned_characters")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(get).await.expect("get");
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: StorageEntry = json_body(response).await;
    assert_eq!(fetched.key, "pinned_characters");
    assert_eq!(fetched.value, stored.value);

    let list = Request::get("/api/storage")
        .body(Body::empty())
        .expect("request");
    let keys: Vec<String> = json_body(app.clone().oneshot(list).await.expect("list")).await;
    assert_eq!(keys, vec!["pinned_characters"]);

    let delete = Request::delete("/api/storage/pinned_characters")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(delete).await.expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let again = Request::get("/api/storage/pinned_characters")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(again).await.expect("get");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn invalid_key_is_a_bad_request() {
    let request = json_request("PUT", "/api/storage/bad%20key", json!(true));
    let response = test_app().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}
