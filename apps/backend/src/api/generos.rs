//! Genres API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use rusqlite::Connection;
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use crate::db::models::Genero;
use crate::db::queries::{self, map_genero_row, GENERO_COLUMNS};
use crate::error::{AppError, ErrorBody, Result};
use crate::utils::serde::double_option;
use crate::validation::{check_max_len, check_not_blank, required, FieldErrors, WriteMode};
use crate::AppState;

/// Request body for creating or updating a genre.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GeneroPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub nome: Option<Option<String>>,
}

/// GET /api/generos
#[utoipa::path(
    get,
    path = "/api/generos",
    responses((status = 200, description = "Genres ordered by name", body = Vec<Genero>)),
    tag = "generos"
)]
pub async fn list_generos(State(state): State<AppState>) -> Result<Json<Vec<Genero>>> {
    let db = state.db.lock().await;

    let mut stmt = db.prepare(&format!(
        "SELECT {} FROM generos ORDER BY nome",
        GENERO_COLUMNS
    ))?;
    let generos = stmt
        .query_map([], map_genero_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Json(generos))
}

/// POST /api/generos
#[utoipa::path(
    post,
    path = "/api/generos",
    request_body = GeneroPayload,
    responses(
        (status = 201, description = "Genre created", body = Genero),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "generos"
)]
pub async fn create_genero(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GeneroPayload>,
) -> Result<(StatusCode, Json<Genero>)> {
    let db = state.db.lock().await;

    let nome = validate(&db, body, WriteMode::Create, None)?;
    db.execute("INSERT INTO generos (nome) VALUES (?1)", [&nome])?;
    let genero = fetch(&db, db.last_insert_rowid())?;

    tracing::info!(genero_id = genero.id, nome = %genero.nome, "Genre created");

    Ok((StatusCode::CREATED, Json(genero)))
}

/// GET /api/generos/{id}
#[utoipa::path(
    get,
    path = "/api/generos/{id}",
    params(("id" = i64, Path, description = "Genre id")),
    responses(
        (status = 200, description = "Genre found", body = Genero),
        (status = 404, description = "Genre not found", body = ErrorBody),
    ),
    tag = "generos"
)]
pub async fn get_genero(
    State(state): State<AppState>,
    ApiPath(genero_id): ApiPath<i64>,
) -> Result<Json<Genero>> {
    let db = state.db.lock().await;
    Ok(Json(fetch(&db, genero_id)?))
}

/// PUT /api/generos/{id}
#[utoipa::path(
    put,
    path = "/api/generos/{id}",
    params(("id" = i64, Path, description = "Genre id")),
    request_body = GeneroPayload,
    responses(
        (status = 200, description = "Genre replaced", body = Genero),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Genre not found", body = ErrorBody),
    ),
    tag = "generos"
)]
pub async fn replace_genero(
    State(state): State<AppState>,
    ApiPath(genero_id): ApiPath<i64>,
    ApiJson(body): ApiJson<GeneroPayload>,
) -> Result<Json<Genero>> {
    save(&state, genero_id, body, WriteMode::Replace).await
}

/// PATCH /api/generos/{id}
#[utoipa::path(
    patch,
    path = "/api/generos/{id}",
    params(("id" = i64, Path, description = "Genre id")),
    request_body = GeneroPayload,
    responses(
        (status = 200, description = "Genre updated", body = Genero),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Genre not found", body = ErrorBody),
    ),
    tag = "generos"
)]
pub async fn patch_genero(
    State(state): State<AppState>,
    ApiPath(genero_id): ApiPath<i64>,
    ApiJson(body): ApiJson<GeneroPayload>,
) -> Result<Json<Genero>> {
    save(&state, genero_id, body, WriteMode::Patch).await
}

/// DELETE /api/generos/{id}
#[utoipa::path(
    delete,
    path = "/api/generos/{id}",
    params(("id" = i64, Path, description = "Genre id")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found", body = ErrorBody),
    ),
    tag = "generos"
)]
pub async fn delete_genero(
    State(state): State<AppState>,
    ApiPath(genero_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    if db.execute("DELETE FROM generos WHERE id = ?1", [genero_id])? == 0 {
        return Err(AppError::NotFound("Genre not found.".to_string()));
    }

    tracing::info!(genero_id = genero_id, "Genre deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn fetch(conn: &Connection, genero_id: i64) -> Result<Genero> {
    queries::find_by_id(conn, "generos", GENERO_COLUMNS, genero_id, map_genero_row)?
        .ok_or_else(|| AppError::NotFound("Genre not found.".to_string()))
}

async fn save(
    state: &AppState,
    genero_id: i64,
    body: GeneroPayload,
    mode: WriteMode,
) -> Result<Json<Genero>> {
    let db = state.db.lock().await;

    let current = fetch(&db, genero_id)?;
    let nome = validate(&db, body, mode, Some(&current))?;
    db.execute(
        "UPDATE generos SET nome = ?1 WHERE id = ?2",
        rusqlite::params![nome, genero_id],
    )?;

    Ok(Json(fetch(&db, genero_id)?))
}

fn validate(
    conn: &Connection,
    body: GeneroPayload,
    mode: WriteMode,
    current: Option<&Genero>,
) -> Result<String> {
    let mut errors = FieldErrors::new();

    let nome = required(
        &mut errors,
        "nome",
        mode,
        body.nome.map(|n| n.map(|n| n.trim().to_string())),
        current.map(|c| c.nome.clone()),
    );
    check_not_blank(&mut errors, "nome", nome.as_deref());
    check_max_len(&mut errors, "nome", nome.as_deref(), 100);
    if let Some(n) = nome.as_deref().filter(|n| !n.is_empty()) {
        if queries::name_taken(conn, "generos", n, current.map(|c| c.id))? {
            errors.add("nome", "genero with this nome already exists.");
        }
    }

    errors.into_result()?;
    Ok(nome.unwrap_or_default())
}
