//! Integration tests for the health check and the shared error envelope.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.server().get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Moviendo Backend is running");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_envelope() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/filmes").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["message"], "The requested resource was not found.");
    assert_eq!(body["path"], "/api/filmes");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_wrong_method() {
    let app = TestApp::new().await;

    let response = app.server().delete("/health").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

    let response = app.server().delete("/api/obras").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_malformed_json() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/generos")
        .content_type("application/json")
        .bytes("{\"nome\": ".into())
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Invalid parameter");
    assert_eq!(body["path"], "/api/generos");
}

#[tokio::test]
async fn test_wrong_json_type() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/tags")
        .json(&serde_json::json!({ "nome": 42 }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "Invalid parameter");
}

#[tokio::test]
async fn test_schema_document() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/schema").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(body["info"]["title"], "Moviendo API");

    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/obras"));
    assert!(paths["/api/obras"]["get"].is_object());
    assert!(paths["/api/obras"]["post"].is_object());
    for method in ["get", "put", "patch", "delete"] {
        assert!(paths["/api/obras/{id}"][method].is_object(), "{}", method);
    }
    assert!(paths.contains_key("/api/obras/importar_tmdb"));
    assert!(body["components"]["schemas"]["Obra"].is_object());
}

#[tokio::test]
async fn test_docs_page() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/docs").await;

    response.assert_status_ok();
    assert!(response.text().contains("Moviendo API"));
}
