//! Integration tests for directors endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn test_create_diretor() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/diretores")
        .json(&json!({
            "nome": "Agnès Varda",
            "biografia": "French director",
            "urlFoto": "https://example.com/varda.jpg"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["nome"], "Agnès Varda");
    assert_eq!(body["urlFoto"], "https://example.com/varda.jpg");
}

#[tokio::test]
async fn test_list_diretores_ordered_by_name() {
    let app = TestApp::new().await;
    app.create("/api/diretores", json!({ "nome": "Wong Kar-wai" }))
        .await;
    app.create("/api/diretores", json!({ "nome": "Akira Kurosawa" }))
        .await;

    let response = app.server().get("/api/diretores").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let nomes: Vec<_> = body
        .as_array()
        .expect("list should be an array")
        .iter()
        .map(|d| d["nome"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(nomes, vec!["Akira Kurosawa", "Wong Kar-wai"]);
}

#[tokio::test]
async fn test_create_diretor_validation() {
    let app = TestApp::new().await;
    app.create("/api/diretores", json!({ "nome": "Jane Campion" }))
        .await;

    let response = app
        .server()
        .post("/api/diretores")
        .json(&json!({ "nome": "Jane Campion", "urlFoto": "campion.jpg" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Validation error");
    assert_eq!(body["path"], "/api/diretores");
    assert!(body["errors"]["nome"][0]
        .as_str()
        .unwrap()
        .contains("already exists"));
    assert_eq!(body["errors"]["urlFoto"][0], "Enter a valid URL.");
}

#[tokio::test]
async fn test_create_diretor_requires_nome() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/diretores")
        .json(&json!({ "biografia": "Nameless" }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["nome"][0], "This field is required.");
}

#[tokio::test]
async fn test_get_diretor_not_found() {
    let app = TestApp::new().await;

    let response = app.server().get("/api/diretores/999").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["path"], "/api/diretores/999");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_patch_diretor_null_clears_and_absent_keeps() {
    let app = TestApp::new().await;
    let id = app
        .create(
            "/api/diretores",
            json!({
                "nome": "Céline Sciamma",
                "biografia": "Portrait of a Lady on Fire",
                "urlFoto": "https://example.com/sciamma.jpg"
            }),
        )
        .await;

    let response = app
        .server()
        .patch(&format!("/api/diretores/{}", id))
        .json(&json!({ "biografia": null }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["nome"], "Céline Sciamma");
    assert!(body["biografia"].is_null());
    assert_eq!(body["urlFoto"], "https://example.com/sciamma.jpg");
}

#[tokio::test]
async fn test_put_diretor_requires_nome() {
    let app = TestApp::new().await;
    let id = app
        .create("/api/diretores", json!({ "nome": "Bong Joon-ho" }))
        .await;

    let response = app
        .server()
        .put(&format!("/api/diretores/{}", id))
        .json(&json!({ "biografia": "Parasite" }))
        .await;

    response.assert_status_bad_request();

    let response = app
        .server()
        .put(&format!("/api/diretores/{}", id))
        .json(&json!({ "nome": "Bong Joon-ho", "biografia": "Parasite" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["biografia"], "Parasite");
}

#[tokio::test]
async fn test_patch_diretor_null_nome_rejected() {
    let app = TestApp::new().await;
    let id = app
        .create("/api/diretores", json!({ "nome": "Kleber Mendonça Filho" }))
        .await;

    let response = app
        .server()
        .patch(&format!("/api/diretores/{}", id))
        .json(&json!({ "nome": null }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["nome"][0], "This field may not be null.");
}

#[tokio::test]
async fn test_rename_to_own_name_is_allowed() {
    let app = TestApp::new().await;
    let id = app
        .create("/api/diretores", json!({ "nome": "Hayao Miyazaki" }))
        .await;

    let response = app
        .server()
        .patch(&format!("/api/diretores/{}", id))
        .json(&json!({ "nome": "Hayao Miyazaki" }))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_delete_diretor_unlinks_works() {
    let app = TestApp::new().await;
    let diretor_id = app
        .create("/api/diretores", json!({ "nome": "Greta Gerwig" }))
        .await;
    let obra_id = app
        .create(
            "/api/obras",
            json!({
                "titulo": "Lady Bird",
                "tipo": "filme",
                "status": "assistido",
                "diretores": [diretor_id]
            }),
        )
        .await;

    let response = app
        .server()
        .delete(&format!("/api/diretores/{}", diretor_id))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app
        .server()
        .get(&format!("/api/diretores/{}", diretor_id))
        .await;
    response.assert_status_not_found();

    let response = app.server().get(&format!("/api/obras/{}", obra_id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["diretores"], json!([]));
}

#[tokio::test]
async fn test_delete_missing_diretor() {
    let app = TestApp::new().await;

    let response = app.server().delete("/api/diretores/42").await;

    response.assert_status_not_found();
}
