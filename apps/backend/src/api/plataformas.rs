//! Streaming platforms API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use rusqlite::{params, Connection};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{parse_filter, ApiJson, ApiPath, ApiQuery};
use crate::db::models::Plataforma;
use crate::db::queries::{self, map_plataforma_row, PLATAFORMA_COLUMNS};
use crate::error::{AppError, ErrorBody, Result};
use crate::utils::serde::double_option;
use crate::validation::{
    check_hex_color, check_max_len, check_not_blank, check_url, normalize_text, optional,
    required, FieldErrors, WriteMode,
};
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for listing platforms.
#[derive(Debug, Deserialize)]
pub struct ListPlataformasQuery {
    /// Only active (`true`) or inactive (`false`) platforms.
    pub ativa: Option<String>,
}

/// Request body for creating or updating a platform.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlataformaPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub nome: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cor: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
    pub ativa: Option<bool>,
}

struct PlataformaFields {
    nome: String,
    logo: Option<String>,
    cor: Option<String>,
    url: Option<String>,
    ativa: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/plataformas
///
/// Lists platforms ordered by name, optionally filtered by `ativa`.
#[utoipa::path(
    get,
    path = "/api/plataformas",
    params(("ativa" = Option<bool>, Query, description = "Only active or inactive platforms")),
    responses(
        (status = 200, description = "Platforms ordered by name", body = Vec<Plataforma>),
        (status = 400, description = "Invalid filter", body = ErrorBody),
    ),
    tag = "plataformas"
)]
pub async fn list_plataformas(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPlataformasQuery>,
) -> Result<Json<Vec<Plataforma>>> {
    let ativa: Option<bool> = parse_filter(query.ativa.as_deref(), "ativa")?;
    let db = state.db.lock().await;

    let mut stmt = db.prepare(&format!(
        "SELECT {} FROM plataformas WHERE (?1 IS NULL OR ativa = ?1) ORDER BY nome",
        PLATAFORMA_COLUMNS
    ))?;
    let plataformas = stmt
        .query_map([ativa], map_plataforma_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Json(plataformas))
}

/// POST /api/plataformas
#[utoipa::path(
    post,
    path = "/api/plataformas",
    request_body = PlataformaPayload,
    responses(
        (status = 201, description = "Platform created", body = Plataforma),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "plataformas"
)]
pub async fn create_plataforma(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PlataformaPayload>,
) -> Result<(StatusCode, Json<Plataforma>)> {
    let db = state.db.lock().await;

    let fields = validate(&db, body, WriteMode::Create, None)?;
    db.execute(
        "INSERT INTO plataformas (nome, logo, cor, url, ativa) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![fields.nome, fields.logo, fields.cor, fields.url, fields.ativa],
    )?;
    let plataforma = fetch(&db, db.last_insert_rowid())?;

    tracing::info!(
        plataforma_id = plataforma.id,
        nome = %plataforma.nome,
        "Platform created"
    );

    Ok((StatusCode::CREATED, Json(plataforma)))
}

/// GET /api/plataformas/{id}
#[utoipa::path(
    get,
    path = "/api/plataformas/{id}",
    params(("id" = i64, Path, description = "Platform id")),
    responses(
        (status = 200, description = "Platform found", body = Plataforma),
        (status = 404, description = "Platform not found", body = ErrorBody),
    ),
    tag = "plataformas"
)]
pub async fn get_plataforma(
    State(state): State<AppState>,
    ApiPath(plataforma_id): ApiPath<i64>,
) -> Result<Json<Plataforma>> {
    let db = state.db.lock().await;
    Ok(Json(fetch(&db, plataforma_id)?))
}

/// PUT /api/plataformas/{id}
#[utoipa::path(
    put,
    path = "/api/plataformas/{id}",
    params(("id" = i64, Path, description = "Platform id")),
    request_body = PlataformaPayload,
    responses(
        (status = 200, description = "Platform replaced", body = Plataforma),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Platform not found", body = ErrorBody),
    ),
    tag = "plataformas"
)]
pub async fn replace_plataforma(
    State(state): State<AppState>,
    ApiPath(plataforma_id): ApiPath<i64>,
    ApiJson(body): ApiJson<PlataformaPayload>,
) -> Result<Json<Plataforma>> {
    save(&state, plataforma_id, body, WriteMode::Replace).await
}

/// PATCH /api/plataformas/{id}
#[utoipa::path(
    patch,
    path = "/api/plataformas/{id}",
    params(("id" = i64, Path, description = "Platform id")),
    request_body = PlataformaPayload,
    responses(
        (status = 200, description = "Platform updated", body = Plataforma),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Platform not found", body = ErrorBody),
    ),
    tag = "plataformas"
)]
pub async fn patch_plataforma(
    State(state): State<AppState>,
    ApiPath(plataforma_id): ApiPath<i64>,
    ApiJson(body): ApiJson<PlataformaPayload>,
) -> Result<Json<Plataforma>> {
    save(&state, plataforma_id, body, WriteMode::Patch).await
}

/// DELETE /api/plataformas/{id}
#[utoipa::path(
    delete,
    path = "/api/plataformas/{id}",
    params(("id" = i64, Path, description = "Platform id")),
    responses(
        (status = 204, description = "Platform deleted"),
        (status = 404, description = "Platform not found", body = ErrorBody),
    ),
    tag = "plataformas"
)]
pub async fn delete_plataforma(
    State(state): State<AppState>,
    ApiPath(plataforma_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    if db.execute("DELETE FROM plataformas WHERE id = ?1", [plataforma_id])? == 0 {
        return Err(AppError::NotFound("Platform not found.".to_string()));
    }

    tracing::info!(plataforma_id = plataforma_id, "Platform deleted");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn fetch(conn: &Connection, plataforma_id: i64) -> Result<Plataforma> {
    queries::find_by_id(
        conn,
        "plataformas",
        PLATAFORMA_COLUMNS,
        plataforma_id,
        map_plataforma_row,
    )?
    .ok_or_else(|| AppError::NotFound("Platform not found.".to_string()))
}

async fn save(
    state: &AppState,
    plataforma_id: i64,
    body: PlataformaPayload,
    mode: WriteMode,
) -> Result<Json<Plataforma>> {
    let db = state.db.lock().await;

    let current = fetch(&db, plataforma_id)?;
    let fields = validate(&db, body, mode, Some(&current))?;
    db.execute(
        "UPDATE plataformas SET nome = ?1, logo = ?2, cor = ?3, url = ?4, ativa = ?5 WHERE id = ?6",
        params![
            fields.nome,
            fields.logo,
            fields.cor,
            fields.url,
            fields.ativa,
            plataforma_id
        ],
    )?;

    tracing::info!(plataforma_id = plataforma_id, "Platform updated");

    Ok(Json(fetch(&db, plataforma_id)?))
}

fn validate(
    conn: &Connection,
    body: PlataformaPayload,
    mode: WriteMode,
    current: Option<&Plataforma>,
) -> Result<PlataformaFields> {
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
        if queries::name_taken(conn, "plataformas", n, current.map(|c| c.id))? {
            errors.add("nome", "plataforma with this nome already exists.");
        }
    }

    let logo = optional(
        body.logo.map(normalize_text),
        current.and_then(|c| c.logo.clone()),
    );
    check_max_len(&mut errors, "logo", logo.as_deref(), 500);

    let cor = optional(
        body.cor.map(normalize_text),
        current.and_then(|c| c.cor.clone()),
    );
    check_hex_color(&mut errors, "cor", cor.as_deref());

    let url = optional(
        body.url.map(normalize_text),
        current.and_then(|c| c.url.clone()),
    );
    check_url(&mut errors, "url", url.as_deref(), 255);

    let ativa = body
        .ativa
        .or_else(|| current.map(|c| c.ativa))
        .unwrap_or(true);

    errors.into_result()?;

    Ok(PlataformaFields {
        nome: nome.unwrap_or_default(),
        logo,
        cor,
        url,
        ativa,
    })
}
