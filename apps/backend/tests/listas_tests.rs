//! Integration tests for curated lists endpoints.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

fn titulos(lista: &Value) -> Vec<String> {
    lista["obras"]
        .as_array()
        .expect("obras should be an array")
        .iter()
        .map(|o| o["titulo"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_lista_with_obras() {
    let app = TestApp::new().await;
    let a = app.create_obra("Before Sunrise", "filme", "assistido").await;
    let b = app.create_obra("Before Sunset", "filme", "assistido").await;

    let response = app
        .server()
        .post("/api/listas")
        .json(&json!({
            "nome": "Trilogy",
            "descricao": "Linklater",
            "obras": [b, a]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["nome"], "Trilogy");
    assert_eq!(body["publica"], false);
    assert_eq!(titulos(&body), vec!["Before Sunset", "Before Sunrise"]);
}

#[tokio::test]
async fn test_create_lista_validation() {
    let app = TestApp::new().await;

    let response = app
        .server()
        .post("/api/listas")
        .json(&json!({ "descricao": "no name", "obras": [5] }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["errors"]["nome"][0], "This field is required.");
    assert_eq!(
        body["errors"]["obras"][0],
        "Invalid pk \"5\" - object does not exist."
    );
}

#[tokio::test]
async fn test_add_obra_is_idempotent() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Spirited Away", "filme", "assistido").await;
    let lista = app
        .create("/api/listas", json!({ "nome": "Ghibli", "publica": true }))
        .await;

    for _ in 0..2 {
        let response = app
            .server()
            .post(&format!("/api/listas/{}/obras/{}", lista, obra))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(titulos(&body), vec!["Spirited Away"]);
        assert_eq!(body["publica"], true);
    }
}

#[tokio::test]
async fn test_add_obra_missing_targets() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Ponyo", "filme", "assistido").await;
    let lista = app.create("/api/listas", json!({ "nome": "Later" })).await;

    let response = app
        .server()
        .post(&format!("/api/listas/999/obras/{}", obra))
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["message"], "List not found.");

    let response = app
        .server()
        .post(&format!("/api/listas/{}/obras/999", lista))
        .await;
    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["message"], "Work not found.");
}

#[tokio::test]
async fn test_remove_obra() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Totoro", "filme", "assistido").await;
    let lista = app
        .create("/api/listas", json!({ "nome": "Comfort", "obras": [obra] }))
        .await;

    let response = app
        .server()
        .delete(&format!("/api/listas/{}/obras/{}", lista, obra))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app.server().get(&format!("/api/listas/{}", lista)).await;
    response.assert_status_ok();
    assert!(titulos(&response.json::<Value>()).is_empty());

    // Removing again reports the missing membership
    let response = app
        .server()
        .delete(&format!("/api/listas/{}/obras/{}", lista, obra))
        .await;
    response.assert_status_not_found();

    // The work itself is untouched
    let response = app.server().get(&format!("/api/obras/{}", obra)).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_patch_lista_keeps_obras_unless_given() {
    let app = TestApp::new().await;
    let a = app.create_obra("Heat", "filme", "assistido").await;
    let b = app.create_obra("Thief", "filme", "assistido").await;
    let lista = app
        .create("/api/listas", json!({ "nome": "Mann", "obras": [a] }))
        .await;

    let response = app
        .server()
        .patch(&format!("/api/listas/{}", lista))
        .json(&json!({ "publica": true }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["publica"], true);
    assert_eq!(titulos(&body), vec!["Heat"]);

    let response = app
        .server()
        .patch(&format!("/api/listas/{}", lista))
        .json(&json!({ "obras": [b] }))
        .await;
    response.assert_status_ok();
    assert_eq!(titulos(&response.json::<Value>()), vec!["Thief"]);
}

#[tokio::test]
async fn test_deleting_obra_removes_it_from_lists() {
    let app = TestApp::new().await;
    let obra = app.create_obra("Collateral", "filme", "assistido").await;
    let lista = app
        .create("/api/listas", json!({ "nome": "Night", "obras": [obra] }))
        .await;

    app.server()
        .delete(&format!("/api/obras/{}", obra))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = app.server().get(&format!("/api/listas/{}", lista)).await;
    assert!(titulos(&response.json::<Value>()).is_empty());
}

#[tokio::test]
async fn test_delete_lista() {
    let app = TestApp::new().await;
    let lista = app.create("/api/listas", json!({ "nome": "Temp" })).await;

    let response = app.server().delete(&format!("/api/listas/{}", lista)).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app.server().get("/api/listas").await;
    assert_eq!(response.json::<Value>(), json!([]));
}
