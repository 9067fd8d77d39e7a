mod common;

use api::app::{build_router, QUERY_PATH};
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use common::*;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.expect("request failed");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    (status, body.to_vec())
}

#[tokio::test]
async fn test_get_query() {
    let app_state = setup_test_state().await;
    let player = create_test_player(&app_state, "http@test.com").await;
    let router = build_router(app_state, &[]);

    let query = format!(r#"{{ player(id: "{}") {{ id number }} }}"#, player.id);
    let uri = format!("{QUERY_PATH}?query={}", urlencoding::encode(&query));
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json,
        json!({ "data": { "player": { "id": player.id, "number": "11" } } })
    );
}

#[tokio::test]
async fn test_get_query_with_variables() {
    let app_state = setup_test_state().await;
    let player = create_test_player(&app_state, "httpvars@test.com").await;
    let router = build_router(app_state, &[]);

    let query = "query One($id: String!) { player(id: $id) { email } }";
    let variables = json!({ "id": player.id }).to_string();
    let uri = format!(
        "{QUERY_PATH}?query={}&variables={}",
        urlencoding::encode(query),
        urlencoding::encode(&variables)
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["player"]["email"], "httpvars@test.com");
}

#[tokio::test]
async fn test_get_query_with_invalid_variables() {
    let router = build_router(setup_test_state().await, &[]);

    let uri = format!(
        "{QUERY_PATH}?query={}&variables={}",
        urlencoding::encode("{ list { id } }"),
        urlencoding::encode("{not json")
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("Invalid variables"));
}

#[tokio::test]
async fn test_get_without_query_parameter() {
    let router = build_router(setup_test_state().await, &[]);

    let request = Request::builder()
        .uri(QUERY_PATH)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("Missing `query`"));
}

#[tokio::test]
async fn test_post_query() {
    let app_state = setup_test_state().await;
    create_test_player(&app_state, "post@test.com").await;
    let router = build_router(app_state, &[]);

    let payload = json!({
        "query": "query Roster { list { email statistics { goals } } }",
        "operationName": "Roster"
    });
    let request = Request::builder()
        .method(Method::POST)
        .uri(QUERY_PATH)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json,
        json!({ "data": { "list": [{ "email": "post@test.com", "statistics": { "goals": 12 } }] } })
    );
}

#[tokio::test]
async fn test_query_errors_are_returned_with_ok_status() {
    let router = build_router(setup_test_state().await, &[]);

    let uri = format!(
        "{QUERY_PATH}?query={}",
        urlencoding::encode(r#"{ player(id: "x") { id nickname } }"#)
    );
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"], json!({ "player": null }));
    assert_eq!(json["errors"][0]["path"], "player.nickname");
    assert!(json["errors"][0]["message"].is_string());
}

#[tokio::test]
async fn test_health() {
    let router = build_router(setup_test_state().await, &[]);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
