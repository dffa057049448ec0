//! Integration tests for genres, platforms and tags endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

// =============================================================================
// Genres
// =============================================================================

#[tokio::test]
async fn test_genero_crud() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/generos")
        .json(&json!({ "nome": "  Drama  " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["nome"], "Drama");
    assert!(body["createdAt"].is_string());
    let id = body["id"].as_i64().unwrap();

    let response = app
        .server()
        .put(&format!("/api/generos/{}", id))
        .json(&json!({ "nome": "Melodrama" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["nome"], "Melodrama");

    let response = app.server().get("/api/generos").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    let response = app.server().delete(&format!("/api/generos/{}", id)).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app.server().get(&format!("/api/generos/{}", id)).await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_genero_name_rules() {
    let app = TestApp::new().await;
    app.create("/api/generos", json!({ "nome": "Horror" })).await;

    let response = app
        .server()
        .post("/api/generos")
        .json(&json!({ "nome": "Horror" }))
        .await;
    response.assert_status_bad_request();

    let response = app
        .server()
        .post("/api/generos")
        .json(&json!({ "nome": "x".repeat(101) }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(
        body["errors"]["nome"][0],
        "Ensure this field has no more than 100 characters."
    );

    let response = app
        .server()
        .post("/api/generos")
        .json(&json!({ "nome": "   " }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["nome"][0], "This field may not be blank.");
}

// =============================================================================
// Platforms
// =============================================================================

#[tokio::test]
async fn test_plataforma_defaults_to_active() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/plataformas")
        .json(&json!({
            "nome": "Netflix",
            "cor": "#E50914",
            "url": "https://www.netflix.com"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["ativa"], true);
    assert_eq!(body["cor"], "#E50914");
    assert!(body["logo"].is_null());
}

#[tokio::test]
async fn test_plataforma_validation() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/plataformas")
        .json(&json!({
            "nome": "Bad",
            "cor": "red",
            "url": "www.example.com",
            "logo": "l".repeat(501)
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["errors"]["cor"].is_array());
    assert!(body["errors"]["url"].is_array());
    assert!(body["errors"]["logo"].is_array());
    assert!(body["errors"].get("nome").is_none());
}

#[tokio::test]
async fn test_plataforma_filter_by_ativa() {
    let app = TestApp::new().await;
    app.create("/api/plataformas", json!({ "nome": "Max" })).await;
    let old = app
        .create("/api/plataformas", json!({ "nome": "Orkut Video" }))
        .await;

    let response = app
        .server()
        .patch(&format!("/api/plataformas/{}", old))
        .json(&json!({ "ativa": false }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["ativa"], false);
    assert_eq!(body["nome"], "Orkut Video");

    let response = app.server().get("/api/plataformas?ativa=true").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let nomes: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["nome"].as_str().unwrap())
        .collect();
    assert_eq!(nomes, vec!["Max"]);

    let response = app.server().get("/api/plataformas?ativa=false").await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    let response = app.server().get("/api/plataformas").await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_plataforma_bad_filter_value() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/plataformas?ativa=maybe").await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid parameter");
}

#[tokio::test]
async fn test_plataforma_blank_filter_is_ignored() {
    let app = TestApp::new().await;
    app.create("/api/plataformas", json!({ "nome": "Globoplay" }))
        .await;
    app.create("/api/plataformas", json!({ "nome": "Netmovies", "ativa": false }))
        .await;

    let response = app.server().get("/api/plataformas?ativa=").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);
}

// =============================================================================
// Tags
// =============================================================================

#[tokio::test]
async fn test_tag_color_and_length() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/tags")
        .json(&json!({ "nome": "rewatch", "cor": "#0f0" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_i64().unwrap();

    let response = app
        .server()
        .post("/api/tags")
        .json(&json!({ "nome": "t".repeat(51) }))
        .await;
    response.assert_status_bad_request();

    let response = app
        .server()
        .patch(&format!("/api/tags/{}", id))
        .json(&json!({ "cor": "#12345" }))
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["cor"][0], "Color must be #RRGGBB or #RGB.");

    let response = app
        .server()
        .patch(&format!("/api/tags/{}", id))
        .json(&json!({ "cor": null }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["cor"].is_null());
    assert_eq!(body["nome"], "rewatch");
}

#[tokio::test]
async fn test_tag_patch_missing() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .patch("/api/tags/7")
        .json(&json!({ "nome": "ghost" }))
        .await;

    response.assert_status_not_found();
}
