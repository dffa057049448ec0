//! Ratings API endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::Deserialize;
use utoipa::ToSchema;

use super::extract::{parse_filter, ApiJson, ApiPath, ApiQuery};
use crate::db::models::Avaliacao;
use crate::db::queries::{self, map_avaliacao_row, AVALIACAO_COLUMNS};
use crate::error::{AppError, ErrorBody, Result};
use crate::utils::serde::double_option;
use crate::validation::{
    check_finite, check_max_len, check_range, normalize_text, optional, report_missing_ids,
    required, FieldErrors, WriteMode,
};
use crate::AppState;

/// Storage format of `data_avaliacao`, matching SQLite's `datetime('now')`.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for listing ratings.
#[derive(Debug, Deserialize)]
pub struct ListAvaliacoesQuery {
    /// Only ratings of this work.
    pub obra: Option<String>,
}

/// Request body for creating or updating a rating.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvaliacaoPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub obra: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nota: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub comentario: Option<Option<String>>,
    /// RFC 3339, `YYYY-MM-DD HH:MM:SS` or a plain date. Defaults to now.
    pub data_avaliacao: Option<String>,
}

struct AvaliacaoFields {
    obra: i64,
    nota: f64,
    comentario: Option<String>,
    data_avaliacao: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/avaliacoes
///
/// Lists ratings, most recent first, optionally for a single work.
#[utoipa::path(
    get,
    path = "/api/avaliacoes",
    params(("obra" = Option<i64>, Query, description = "Only ratings of this work")),
    responses(
        (status = 200, description = "Ratings, most recent first", body = Vec<Avaliacao>),
        (status = 400, description = "Invalid filter", body = ErrorBody),
    ),
    tag = "avaliacoes"
)]
pub async fn list_avaliacoes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListAvaliacoesQuery>,
) -> Result<Json<Vec<Avaliacao>>> {
    let obra: Option<i64> = parse_filter(query.obra.as_deref(), "obra")?;
    let db = state.db.lock().await;
    Ok(Json(list(&db, obra)?))
}

/// GET /api/avaliacoes/obra/{obra_id}
#[utoipa::path(
    get,
    path = "/api/avaliacoes/obra/{obra_id}",
    params(("obra_id" = i64, Path, description = "Work id")),
    responses((status = 200, description = "Ratings of the work", body = Vec<Avaliacao>)),
    tag = "avaliacoes"
)]
pub async fn list_avaliacoes_obra(
    State(state): State<AppState>,
    ApiPath(obra_id): ApiPath<i64>,
) -> Result<Json<Vec<Avaliacao>>> {
    let db = state.db.lock().await;

    if !queries::exists(&db, "obras", obra_id)? {
        return Err(AppError::NotFound("Work not found.".to_string()));
    }

    Ok(Json(list(&db, Some(obra_id))?))
}

/// POST /api/avaliacoes
#[utoipa::path(
    post,
    path = "/api/avaliacoes",
    request_body = AvaliacaoPayload,
    responses(
        (status = 201, description = "Rating created", body = Avaliacao),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "avaliacoes"
)]
pub async fn create_avaliacao(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AvaliacaoPayload>,
) -> Result<(StatusCode, Json<Avaliacao>)> {
    let db = state.db.lock().await;

    let fields = validate(&db, body, WriteMode::Create, None)?;
    db.execute(
        r#"
        INSERT INTO avaliacoes (obra_id, nota, comentario, data_avaliacao)
        VALUES (?1, ?2, ?3, COALESCE(?4, datetime('now')))
        "#,
        params![
            fields.obra,
            fields.nota,
            fields.comentario,
            fields.data_avaliacao
        ],
    )?;
    let avaliacao = fetch(&db, db.last_insert_rowid())?;

    tracing::info!(
        avaliacao_id = avaliacao.id,
        obra_id = avaliacao.obra,
        nota = avaliacao.nota,
        "Rating created"
    );

    Ok((StatusCode::CREATED, Json(avaliacao)))
}

/// GET /api/avaliacoes/{id}
#[utoipa::path(
    get,
    path = "/api/avaliacoes/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    responses(
        (status = 200, description = "Rating found", body = Avaliacao),
        (status = 404, description = "Rating not found", body = ErrorBody),
    ),
    tag = "avaliacoes"
)]
pub async fn get_avaliacao(
    State(state): State<AppState>,
    ApiPath(avaliacao_id): ApiPath<i64>,
) -> Result<Json<Avaliacao>> {
    let db = state.db.lock().await;
    Ok(Json(fetch(&db, avaliacao_id)?))
}

/// PUT /api/avaliacoes/{id}
#[utoipa::path(
    put,
    path = "/api/avaliacoes/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    request_body = AvaliacaoPayload,
    responses(
        (status = 200, description = "Rating replaced", body = Avaliacao),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Rating not found", body = ErrorBody),
    ),
    tag = "avaliacoes"
)]
pub async fn replace_avaliacao(
    State(state): State<AppState>,
    ApiPath(avaliacao_id): ApiPath<i64>,
    ApiJson(body): ApiJson<AvaliacaoPayload>,
) -> Result<Json<Avaliacao>> {
    save(&state, avaliacao_id, body, WriteMode::Replace).await
}

/// PATCH /api/avaliacoes/{id}
#[utoipa::path(
    patch,
    path = "/api/avaliacoes/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    request_body = AvaliacaoPayload,
    responses(
        (status = 200, description = "Rating updated", body = Avaliacao),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Rating not found", body = ErrorBody),
    ),
    tag = "avaliacoes"
)]
pub async fn patch_avaliacao(
    State(state): State<AppState>,
    ApiPath(avaliacao_id): ApiPath<i64>,
    ApiJson(body): ApiJson<AvaliacaoPayload>,
) -> Result<Json<Avaliacao>> {
    save(&state, avaliacao_id, body, WriteMode::Patch).await
}

/// DELETE /api/avaliacoes/{id}
#[utoipa::path(
    delete,
    path = "/api/avaliacoes/{id}",
    params(("id" = i64, Path, description = "Rating id")),
    responses(
        (status = 204, description = "Rating deleted"),
        (status = 404, description = "Rating not found", body = ErrorBody),
    ),
    tag = "avaliacoes"
)]
pub async fn delete_avaliacao(
    State(state): State<AppState>,
    ApiPath(avaliacao_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    if db.execute("DELETE FROM avaliacoes WHERE id = ?1", [avaliacao_id])? == 0 {
        return Err(AppError::NotFound("Rating not found.".to_string()));
    }

    tracing::info!(avaliacao_id = avaliacao_id, "Rating deleted");

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Helpers
// =============================================================================

fn list(conn: &Connection, obra_id: Option<i64>) -> Result<Vec<Avaliacao>> {
    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM avaliacoes
        WHERE (?1 IS NULL OR obra_id = ?1)
        ORDER BY data_avaliacao DESC, id DESC
        "#,
        AVALIACAO_COLUMNS
    ))?;
    let avaliacoes = stmt
        .query_map([obra_id], map_avaliacao_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(avaliacoes)
}

fn fetch(conn: &Connection, avaliacao_id: i64) -> Result<Avaliacao> {
    queries::find_by_id(
        conn,
        "avaliacoes",
        AVALIACAO_COLUMNS,
        avaliacao_id,
        map_avaliacao_row,
    )?
    .ok_or_else(|| AppError::NotFound("Rating not found.".to_string()))
}

/// Any update marks the rating as edited.
async fn save(
    state: &AppState,
    avaliacao_id: i64,
    body: AvaliacaoPayload,
    mode: WriteMode,
) -> Result<Json<Avaliacao>> {
    let db = state.db.lock().await;

    let current = fetch(&db, avaliacao_id)?;
    let fields = validate(&db, body, mode, Some(&current))?;

    db.execute(
        r#"
        UPDATE avaliacoes SET
            obra_id = ?1, nota = ?2, comentario = ?3, data_avaliacao = ?4,
            editado = 1, updated_at = datetime('now')
        WHERE id = ?5
        "#,
        params![
            fields.obra,
            fields.nota,
            fields.comentario,
            fields.data_avaliacao.unwrap_or(current.data_avaliacao),
            avaliacao_id
        ],
    )?;

    tracing::info!(avaliacao_id = avaliacao_id, "Rating updated");

    Ok(Json(fetch(&db, avaliacao_id)?))
}

/// Normalizes an accepted timestamp to UTC in [`DATETIME_FORMAT`].
fn parse_datetime(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).format(DATETIME_FORMAT).to_string());
    }
    for format in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.format(DATETIME_FORMAT).to_string());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
}

fn validate(
    conn: &Connection,
    body: AvaliacaoPayload,
    mode: WriteMode,
    current: Option<&Avaliacao>,
) -> Result<AvaliacaoFields> {
    let mut errors = FieldErrors::new();

    let obra = required(&mut errors, "obra", mode, body.obra, current.map(|c| c.obra));
    if let Some(obra_id) = obra {
        report_missing_ids(
            &mut errors,
            "obra",
            &queries::missing_ids(conn, "obras", &[obra_id])?,
        );
    }

    let nota = required(&mut errors, "nota", mode, body.nota, current.map(|c| c.nota));
    check_finite(&mut errors, "nota", nota);
    check_range(&mut errors, "nota", nota, 0.0, 10.0);

    let comentario = optional(
        body.comentario.map(normalize_text),
        current.and_then(|c| c.comentario.clone()),
    );
    check_max_len(&mut errors, "comentario", comentario.as_deref(), 2000);

    let data_avaliacao = match normalize_text(body.data_avaliacao) {
        Some(raw) => {
            let parsed = parse_datetime(&raw);
            if parsed.is_none() {
                errors.add(
                    "dataAvaliacao",
                    "Datetime has wrong format. Use RFC 3339 or YYYY-MM-DD HH:MM:SS.",
                );
            }
            parsed
        }
        None => None,
    };

    errors.into_result()?;

    let (Some(obra), Some(nota)) = (obra, nota) else {
        return Err(AppError::Internal("rating fields lost after validation".to_string()));
    };

    Ok(AvaliacaoFields {
        obra,
        nota,
        comentario,
        data_avaliacao,
    })
}
