//! Directors API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use rusqlite::{params, Connection};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use crate::db::models::Diretor;
use crate::db::queries::{self, map_diretor_row, DIRETOR_COLUMNS};
use crate::error::{AppError, ErrorBody, Result};
use crate::utils::serde::double_option;
use crate::validation::{
    check_max_len, check_not_blank, check_url, normalize_text, optional, required, FieldErrors,
    WriteMode,
};
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request body for creating or updating a director.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiretorPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub nome: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub biografia: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url_foto: Option<Option<String>>,
}

struct DiretorFields {
    nome: String,
    biografia: Option<String>,
    url_foto: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/diretores
///
/// Lists all directors ordered by name.
#[utoipa::path(
    get,
    path = "/api/diretores",
    responses((status = 200, description = "Directors ordered by name", body = Vec<Diretor>)),
    tag = "diretores"
)]
pub async fn list_diretores(State(state): State<AppState>) -> Result<Json<Vec<Diretor>>> {
    let db = state.db.lock().await;

    let mut stmt = db.prepare(&format!(
        "SELECT {} FROM diretores ORDER BY nome",
        DIRETOR_COLUMNS
    ))?;
    let diretores = stmt
        .query_map([], map_diretor_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Json(diretores))
}

/// POST /api/diretores
#[utoipa::path(
    post,
    path = "/api/diretores",
    request_body = DiretorPayload,
    responses(
        (status = 201, description = "Director created", body = Diretor),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "diretores"
)]
pub async fn create_diretor(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<DiretorPayload>,
) -> Result<(StatusCode, Json<Diretor>)> {
    let db = state.db.lock().await;

    let fields = validate(&db, body, WriteMode::Create, None)?;
    db.execute(
        "INSERT INTO diretores (nome, biografia, url_foto) VALUES (?1, ?2, ?3)",
        params![fields.nome, fields.biografia, fields.url_foto],
    )?;
    let diretor = fetch(&db, db.last_insert_rowid())?;

    tracing::info!(diretor_id = diretor.id, nome = %diretor.nome, "Director created");

    Ok((StatusCode::CREATED, Json(diretor)))
}

/// GET /api/diretores/{id}
#[utoipa::path(
    get,
    path = "/api/diretores/{id}",
    params(("id" = i64, Path, description = "Director id")),
    responses(
        (status = 200, description = "Director found", body = Diretor),
        (status = 404, description = "Director not found", body = ErrorBody),
    ),
    tag = "diretores"
)]
pub async fn get_diretor(
    State(state): State<AppState>,
    ApiPath(diretor_id): ApiPath<i64>,
) -> Result<Json<Diretor>> {
    let db = state.db.lock().await;
    Ok(Json(fetch(&db, diretor_id)?))
}

/// PUT /api/diretores/{id}
#[utoipa::path(
    put,
    path = "/api/diretores/{id}",
    params(("id" = i64, Path, description = "Director id")),
    request_body = DiretorPayload,
    responses(
        (status = 200, description = "Director replaced", body = Diretor),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Director not found", body = ErrorBody),
    ),
    tag = "diretores"
)]
pub async fn replace_diretor(
    State(state): State<AppState>,
    ApiPath(diretor_id): ApiPath<i64>,
    ApiJson(body): ApiJson<DiretorPayload>,
) -> Result<Json<Diretor>> {
    save(&state, diretor_id, body, WriteMode::Replace).await
}

/// PATCH /api/diretores/{id}
#[utoipa::path(
    patch,
    path = "/api/diretores/{id}",
    params(("id" = i64, Path, description = "Director id")),
    request_body = DiretorPayload,
    responses(
        (status = 200, description = "Director updated", body = Diretor),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Director not found", body = ErrorBody),
    ),
    tag = "diretores"
)]
pub async fn patch_diretor(
    State(state): State<AppState>,
    ApiPath(diretor_id): ApiPath<i64>,
    ApiJson(body): ApiJson<DiretorPayload>,
) -> Result<Json<Diretor>> {
    save(&state, diretor_id, body, WriteMode::Patch).await
}

/// DELETE /api/diretores/{id}
///
/// Removes the director; works keep existing without the link.
#[utoipa::path(
    delete,
    path = "/api/diretores/{id}",
    params(("id" = i64, Path, description = "Director id")),
    responses(
        (status = 204, description = "Director deleted"),
        (status = 404, description = "Director not found", body = ErrorBody),
    ),
    tag = "diretores"
)]
pub async fn delete_diretor(
    State(state): State<AppState>,
    ApiPath(diretor_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    let deleted = db.execute("DELETE FROM diretores WHERE id = ?1", [diretor_id])?;
    if deleted == 0 {
        return Err(AppError::NotFound("Director not found.".to_string()));
    }

    tracing::info!(diretor_id = diretor_id, "Director deleted");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn fetch(conn: &Connection, diretor_id: i64) -> Result<Diretor> {
    queries::find_by_id(conn, "diretores", DIRETOR_COLUMNS, diretor_id, map_diretor_row)?
        .ok_or_else(|| AppError::NotFound("Director not found.".to_string()))
}

async fn save(
    state: &AppState,
    diretor_id: i64,
    body: DiretorPayload,
    mode: WriteMode,
) -> Result<Json<Diretor>> {
    let db = state.db.lock().await;

    let current = fetch(&db, diretor_id)?;
    let fields = validate(&db, body, mode, Some(&current))?;

    db.execute(
        "UPDATE diretores SET nome = ?1, biografia = ?2, url_foto = ?3 WHERE id = ?4",
        params![fields.nome, fields.biografia, fields.url_foto, diretor_id],
    )?;

    tracing::info!(diretor_id = diretor_id, "Director updated");

    Ok(Json(fetch(&db, diretor_id)?))
}

fn validate(
    conn: &Connection,
    body: DiretorPayload,
    mode: WriteMode,
    current: Option<&Diretor>,
) -> Result<DiretorFields> {
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
    if let Some(n) = nome.as_deref().filter(|n| !n.is_empty()) {
        if queries::name_taken(conn, "diretores", n, current.map(|c| c.id))? {
            errors.add("nome", "diretor with this nome already exists.");
        }
    }

    let biografia = optional(
        body.biografia.map(normalize_text),
        current.and_then(|c| c.biografia.clone()),
    );
    let url_foto = optional(
        body.url_foto.map(normalize_text),
        current.and_then(|c| c.url_foto.clone()),
    );
    check_url(&mut errors, "urlFoto", url_foto.as_deref(), 255);

    errors.into_result()?;

    Ok(DiretorFields {
        nome: nome.unwrap_or_default(),
        biografia,
        url_foto,
    })
}
