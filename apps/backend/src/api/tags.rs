//! Tags API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use rusqlite::{params, Connection};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{ApiJson, ApiPath};
use crate::db::models::Tag;
use crate::db::queries::{self, map_tag_row, TAG_COLUMNS};
use crate::error::{AppError, ErrorBody, Result};
use crate::utils::serde::double_option;
use crate::validation::{
    check_hex_color, check_max_len, check_not_blank, normalize_text, optional, required,
    FieldErrors, WriteMode,
};
use crate::AppState;

/// Request body for creating or updating a tag.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TagPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub nome: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cor: Option<Option<String>>,
}

/// GET /api/tags
#[utoipa::path(
    get,
    path = "/api/tags",
    responses((status = 200, description = "Tags ordered by name", body = Vec<Tag>)),
    tag = "tags"
)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    let db = state.db.lock().await;

    let mut stmt = db.prepare(&format!("SELECT {} FROM tags ORDER BY nome", TAG_COLUMNS))?;
    let tags = stmt
        .query_map([], map_tag_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Json(tags))
}

/// POST /api/tags
#[utoipa::path(
    post,
    path = "/api/tags",
    request_body = TagPayload,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "tags"
)]
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TagPayload>,
) -> Result<(StatusCode, Json<Tag>)> {
    let db = state.db.lock().await;

    let (nome, cor) = validate(&db, body, WriteMode::Create, None)?;
    db.execute(
        "INSERT INTO tags (nome, cor) VALUES (?1, ?2)",
        params![nome, cor],
    )?;
    let tag = fetch(&db, db.last_insert_rowid())?;

    tracing::info!(tag_id = tag.id, nome = %tag.nome, "Tag created");

    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /api/tags/{id}
#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 200, description = "Tag found", body = Tag),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
pub async fn get_tag(
    State(state): State<AppState>,
    ApiPath(tag_id): ApiPath<i64>,
) -> Result<Json<Tag>> {
    let db = state.db.lock().await;
    Ok(Json(fetch(&db, tag_id)?))
}

/// PUT /api/tags/{id}
#[utoipa::path(
    put,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    request_body = TagPayload,
    responses(
        (status = 200, description = "Tag replaced", body = Tag),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
pub async fn replace_tag(
    State(state): State<AppState>,
    ApiPath(tag_id): ApiPath<i64>,
    ApiJson(body): ApiJson<TagPayload>,
) -> Result<Json<Tag>> {
    save(&state, tag_id, body, WriteMode::Replace).await
}

/// PATCH /api/tags/{id}
#[utoipa::path(
    patch,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    request_body = TagPayload,
    responses(
        (status = 200, description = "Tag updated", body = Tag),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
pub async fn patch_tag(
    State(state): State<AppState>,
    ApiPath(tag_id): ApiPath<i64>,
    ApiJson(body): ApiJson<TagPayload>,
) -> Result<Json<Tag>> {
    save(&state, tag_id, body, WriteMode::Patch).await
}

/// DELETE /api/tags/{id}
#[utoipa::path(
    delete,
    path = "/api/tags/{id}",
    params(("id" = i64, Path, description = "Tag id")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = ErrorBody),
    ),
    tag = "tags"
)]
pub async fn delete_tag(
    State(state): State<AppState>,
    ApiPath(tag_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    if db.execute("DELETE FROM tags WHERE id = ?1", [tag_id])? == 0 {
        return Err(AppError::NotFound("Tag not found.".to_string()));
    }

    tracing::info!(tag_id = tag_id, "Tag deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn fetch(conn: &Connection, tag_id: i64) -> Result<Tag> {
    queries::find_by_id(conn, "tags", TAG_COLUMNS, tag_id, map_tag_row)?
        .ok_or_else(|| AppError::NotFound("Tag not found.".to_string()))
}

async fn save(
    state: &AppState,
    tag_id: i64,
    body: TagPayload,
    mode: WriteMode,
) -> Result<Json<Tag>> {
    let db = state.db.lock().await;

    let current = fetch(&db, tag_id)?;
    let (nome, cor) = validate(&db, body, mode, Some(&current))?;
    db.execute(
        "UPDATE tags SET nome = ?1, cor = ?2 WHERE id = ?3",
        params![nome, cor, tag_id],
    )?;

    Ok(Json(fetch(&db, tag_id)?))
}

fn validate(
    conn: &Connection,
    body: TagPayload,
    mode: WriteMode,
    current: Option<&Tag>,
) -> Result<(String, Option<String>)> {
    let mut errors = FieldErrors::new();

    let nome = required(
        &mut errors,
        "nome",
        mode,
        body.nome.map(|n| n.map(|n| n.trim().to_string())),
        current.map(|c| c.nome.clone()),
    );
    check_not_blank(&mut errors, "nome", nome.as_deref());
    check_max_len(&mut errors, "nome", nome.as_deref(), 50);
    if let Some(n) = nome.as_deref().filter(|n| !n.is_empty()) {
        if queries::name_taken(conn, "tags", n, current.map(|c| c.id))? {
            errors.add("nome", "tag with this nome already exists.");
        }
    }

    let cor = optional(
        body.cor.map(normalize_text),
        current.and_then(|c| c.cor.clone()),
    );
    check_hex_color(&mut errors, "cor", cor.as_deref());

    errors.into_result()?;
    Ok((nome.unwrap_or_default(), cor))
}
