//! Integration tests for ratings endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_avaliacao_defaults() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Amélie", "filme", "assistido").await;

    let response = app
        .server()
        .post("/api/avaliacoes")
        .json(&json!({ "obra": obra, "nota": 9.5, "comentario": "Charming" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["obra"], obra);
    assert_eq!(body["nota"], 9.5);
    assert_eq!(body["editado"], false);
    assert!(body["dataAvaliacao"].is_string());
}

#[tokio::test]
async fn test_create_avaliacao_validation() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/avaliacoes")
        .json(&json!({ "obra": 77, "nota": 11 }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(
        body["errors"]["obra"][0],
        "Invalid pk \"77\" - object does not exist."
    );
    assert_eq!(
        body["errors"]["nota"][0],
        "Ensure this value is less than or equal to 10."
    );
}

#[tokio::test]
async fn test_create_avaliacao_requires_fields() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/avaliacoes")
        .json(&json!({ "comentario": "no target" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["obra"][0], "This field is required.");
    assert_eq!(body["errors"]["nota"][0], "This field is required.");
}

#[tokio::test]
async fn test_explicit_data_avaliacao() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Up", "filme", "assistido").await;

    let response = app
        .server()
        .post("/api/avaliacoes")
        .json(&json!({ "obra": obra, "nota": 8, "dataAvaliacao": "2023-06-01T10:00:00Z" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["dataAvaliacao"], "2023-06-01 10:00:00");

    let response = app
        .server()
        .post("/api/avaliacoes")
        .json(&json!({ "obra": obra, "nota": 8, "dataAvaliacao": "last tuesday" }))
        .await;
    response.assert_status_bad_request();
    assert!(response.json::<Value>()["errors"]["dataAvaliacao"].is_array());
}

#[tokio::test]
async fn test_update_marks_editado() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Coco", "filme", "assistido").await;
    let id = app
        .create("/api/avaliacoes", json!({ "obra": obra, "nota": 8.0 }))
        .await;

    let response = app
        .server()
        .patch(&format!("/api/avaliacoes/{}", id))
        .json(&json!({ "nota": 9.0 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["nota"], 9.0);
    assert_eq!(body["editado"], true);
    assert_eq!(body["obra"], obra);
}

#[tokio::test]
async fn test_put_avaliacao_requires_nota() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Soul", "filme", "assistido").await;
    let id = app
        .create("/api/avaliacoes", json!({ "obra": obra, "nota": 7 }))
        .await;

    let response = app
        .server()
        .put(&format!("/api/avaliacoes/{}", id))
        .json(&json!({ "obra": obra }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["nota"][0], "This field is required.");
}

#[tokio::test]
async fn test_filter_by_obra() {
    let app = TestApp::new().await;
    let a = app.create_obra("Alien", "filme", "assistido").await;
    let b = app.create_obra("Aliens", "filme", "assistido").await;
    app.create("/api/avaliacoes", json!({ "obra": a, "nota": 9 }))
        .await;
    app.create("/api/avaliacoes", json!({ "obra": b, "nota": 8 }))
        .await;
    app.create("/api/avaliacoes", json!({ "obra": b, "nota": 7 }))
        .await;

    let response = app
        .server()
        .get(&format!("/api/avaliacoes?obra={}", b))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);

    let response = app
        .server()
        .get(&format!("/api/avaliacoes/obra/{}", a))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["nota"], 9.0);

    let response = app.server().get("/api/avaliacoes").await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_blank_obra_filter_is_ignored() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Brazil", "filme", "assistido").await;
    app.create("/api/avaliacoes", json!({ "obra": obra, "nota": 8 }))
        .await;

    let response = app.server().get("/api/avaliacoes?obra=").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    let response = app.server().get("/api/avaliacoes?obra=abc").await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_ratings_of_missing_obra() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/avaliacoes/obra/31337").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_delete_avaliacao() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Memento", "filme", "assistido").await;
    let id = app
        .create("/api/avaliacoes", json!({ "obra": obra, "nota": 8.4 }))
        .await;

    let response = app
        .server()
        .delete(&format!("/api/avaliacoes/{}", id))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app.server().get(&format!("/api/avaliacoes/{}", id)).await;
    response.assert_status_not_found();
}
