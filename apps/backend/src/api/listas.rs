//! Curated lists API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use rusqlite::{params, Connection};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use crate::db::models::Lista;
use crate::db::queries;
use crate::error::{AppError, ErrorBody, Result};
use crate::utils::serde::double_option;
use crate::validation::{
    check_max_len, check_not_blank, normalize_text, optional, report_missing_ids, required,
    FieldErrors, WriteMode,
};
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request body for creating or updating a list.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListaPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub nome: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub descricao: Option<Option<String>>,
    pub publica: Option<bool>,
    /// Work ids in display order; replaces the current members.
    pub obras: Option<Vec<i64>>,
}

struct ListaFields {
    nome: String,
    descricao: Option<String>,
    publica: bool,
    obras: Option<Vec<i64>>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/listas
#[utoipa::path(
    get,
    path = "/api/listas",
    responses((status = 200, description = "Lists, newest first", body = Vec<Lista>)),
    tag = "listas"
)]
pub async fn list_listas(State(state): State<AppState>) -> Result<Json<Vec<Lista>>> {
    let db = state.db.lock().await;
    Ok(Json(queries::list_listas(&db)?))
}

/// POST /api/listas
#[utoipa::path(
    post,
    path = "/api/listas",
    request_body = ListaPayload,
    responses(
        (status = 201, description = "List created", body = Lista),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn create_lista(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ListaPayload>,
) -> Result<(StatusCode, Json<Lista>)> {
    let mut db = state.db.lock().await;

    let fields = validate(&db, body, WriteMode::Create, None)?;

    let tx = db.transaction()?;
    tx.execute(
        "INSERT INTO listas (nome, descricao, publica) VALUES (?1, ?2, ?3)",
        params![fields.nome, fields.descricao, fields.publica],
    )?;
    let lista_id = tx.last_insert_rowid();
    if let Some(obras) = &fields.obras {
        set_obras(&tx, lista_id, obras)?;
    }
    let lista = queries::get_lista(&tx, lista_id)?;
    tx.commit()?;

    tracing::info!(lista_id = lista.id, nome = %lista.nome, "List created");

    Ok((StatusCode::CREATED, Json(lista)))
}

/// GET /api/listas/{id}
#[utoipa::path(
    get,
    path = "/api/listas/{id}",
    params(("id" = i64, Path, description = "List id")),
    responses(
        (status = 200, description = "List found", body = Lista),
        (status = 404, description = "List not found", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn get_lista(
    State(state): State<AppState>,
    ApiPath(lista_id): ApiPath<i64>,
) -> Result<Json<Lista>> {
    let db = state.db.lock().await;
    let lista = queries::get_lista(&db, lista_id).map_err(AppError::not_found_or("List"))?;
    Ok(Json(lista))
}

/// PUT /api/listas/{id}
#[utoipa::path(
    put,
    path = "/api/listas/{id}",
    params(("id" = i64, Path, description = "List id")),
    request_body = ListaPayload,
    responses(
        (status = 200, description = "List replaced", body = Lista),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "List not found", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn replace_lista(
    State(state): State<AppState>,
    ApiPath(lista_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ListaPayload>,
) -> Result<Json<Lista>> {
    save(&state, lista_id, body, WriteMode::Replace).await
}

/// PATCH /api/listas/{id}
#[utoipa::path(
    patch,
    path = "/api/listas/{id}",
    params(("id" = i64, Path, description = "List id")),
    request_body = ListaPayload,
    responses(
        (status = 200, description = "List updated", body = Lista),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "List not found", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn patch_lista(
    State(state): State<AppState>,
    ApiPath(lista_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ListaPayload>,
) -> Result<Json<Lista>> {
    save(&state, lista_id, body, WriteMode::Patch).await
}

/// DELETE /api/listas/{id}
///
/// Deletes the list only; its works stay in the catalog.
#[utoipa::path(
    delete,
    path = "/api/listas/{id}",
    params(("id" = i64, Path, description = "List id")),
    responses(
        (status = 204, description = "List deleted"),
        (status = 404, description = "List not found", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn delete_lista(
    State(state): State<AppState>,
    ApiPath(lista_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    if db.execute("DELETE FROM listas WHERE id = ?1", [lista_id])? == 0 {
        return Err(AppError::NotFound("List not found.".to_string()));
    }

    tracing::info!(lista_id = lista_id, "List deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/listas/{id}/obras/{obra_id}
///
/// Appends a work to the list. Adding a work twice is a no-op.
#[utoipa::path(
    post,
    path = "/api/listas/{id}/obras/{obra_id}",
    params(
        ("id" = i64, Path, description = "List id"),
        ("obra_id" = i64, Path, description = "Work id"),
    ),
    responses(
        (status = 200, description = "Updated list", body = Lista),
        (status = 404, description = "List or work not found", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn add_obra(
    State(state): State<AppState>,
    ApiPath((lista_id, obra_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Lista>> {
    let db = state.db.lock().await;

    ensure_exists(&db, lista_id, obra_id)?;
    let added = db.execute(
        "INSERT OR IGNORE INTO listas_obras (lista_id, obra_id) VALUES (?1, ?2)",
        params![lista_id, obra_id],
    )?;
    if added > 0 {
        touch(&db, lista_id)?;
        tracing::info!(lista_id = lista_id, obra_id = obra_id, "Work added to list");
    }

    Ok(Json(queries::get_lista(&db, lista_id)?))
}

/// DELETE /api/listas/{id}/obras/{obra_id}
#[utoipa::path(
    delete,
    path = "/api/listas/{id}/obras/{obra_id}",
    params(
        ("id" = i64, Path, description = "List id"),
        ("obra_id" = i64, Path, description = "Work id"),
    ),
    responses(
        (status = 204, description = "Work removed from the list"),
        (status = 404, description = "List or work not found", body = ErrorBody),
    ),
    tag = "listas"
)]
pub async fn remove_obra(
    State(state): State<AppState>,
    ApiPath((lista_id, obra_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    ensure_exists(&db, lista_id, obra_id)?;
    let removed = db.execute(
        "DELETE FROM listas_obras WHERE lista_id = ?1 AND obra_id = ?2",
        params![lista_id, obra_id],
    )?;
    if removed == 0 {
        return Err(AppError::NotFound("Work is not in this list.".to_string()));
    }
    touch(&db, lista_id)?;

    tracing::info!(lista_id = lista_id, obra_id = obra_id, "Work removed from list");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn ensure_exists(conn: &Connection, lista_id: i64, obra_id: i64) -> Result<()> {
    if !queries::exists(conn, "listas", lista_id)? {
        return Err(AppError::NotFound("List not found.".to_string()));
    }
    if !queries::exists(conn, "obras", obra_id)? {
        return Err(AppError::NotFound("Work not found.".to_string()));
    }
    Ok(())
}

fn touch(conn: &Connection, lista_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE listas SET updated_at = datetime('now') WHERE id = ?1",
        [lista_id],
    )?;
    Ok(())
}

/// Replaces the members of a list, keeping the given order.
fn set_obras(conn: &Connection, lista_id: i64, obras: &[i64]) -> Result<()> {
    conn.execute("DELETE FROM listas_obras WHERE lista_id = ?1", [lista_id])?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO listas_obras (lista_id, obra_id) VALUES (?1, ?2)",
    )?;
    for obra_id in obras {
        stmt.execute(params![lista_id, obra_id])?;
    }
    Ok(())
}

async fn save(
    state: &AppState,
    lista_id: i64,
    body: ListaPayload,
    mode: WriteMode,
) -> Result<Json<Lista>> {
    let mut db = state.db.lock().await;

    let current = queries::get_lista(&db, lista_id).map_err(AppError::not_found_or("List"))?;
    let fields = validate(&db, body, mode, Some(&current))?;

    let tx = db.transaction()?;
    tx.execute(
        r#"
        UPDATE listas SET nome = ?1, descricao = ?2, publica = ?3, updated_at = datetime('now')
        WHERE id = ?4
        "#,
        params![fields.nome, fields.descricao, fields.publica, lista_id],
    )?;
    if let Some(obras) = &fields.obras {
        set_obras(&tx, lista_id, obras)?;
    }
    let lista = queries::get_lista(&tx, lista_id)?;
    tx.commit()?;

    tracing::info!(lista_id = lista_id, "List updated");

    Ok(Json(lista))
}

fn validate(
    conn: &Connection,
    body: ListaPayload,
    mode: WriteMode,
    current: Option<&Lista>,
) -> Result<ListaFields> {
    let mut errors = FieldErrors::new();

    let nome = required(
        &mut errors,
        "nome",
        mode,
        body.nome.map(|n| n.map(|n| n.trim().to_string())),
        current.map(|c| c.nome.clone()),
    );
    check_not_blank(&mut errors, "nome", nome.as_deref());
    check_max_len(&mut errors, "nome", nome.as_deref(), 255);

    let descricao = optional(
        body.descricao.map(normalize_text),
        current.and_then(|c| c.descricao.clone()),
    );

    let publica = body
        .publica
        .or_else(|| current.map(|c| c.publica))
        .unwrap_or(false);

    if let Some(obras) = &body.obras {
        report_missing_ids(
            &mut errors,
            "obras",
            &queries::missing_ids(conn, "obras", obras)?,
        );
    }

    errors.into_result()?;

    Ok(ListaFields {
        nome: nome.unwrap_or_default(),
        descricao,
        publica,
        obras: body.obras,
    })
}
