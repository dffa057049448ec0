//! Works (movies and series) API endpoints, including TMDB search and import.

use axum::{extract::State, http::StatusCode, Json};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::collections::BTreeMap;

use super::extract::{parse_filter, ApiJson, ApiPath, ApiQuery};
use crate::db::models::{Obra, StatusObra, TipoObra};
use crate::db::queries::{self, ObraFilter, Relacao};
use crate::error::{AppError, ErrorBody, Result};
use crate::services::importer;
use crate::services::tmdb::{TmdbApi, TmdbDetails, TmdbMediaType, TmdbSearchResult};
use crate::utils::serde::double_option;
use crate::validation::{
    check_finite, check_max_len, check_min, check_not_blank, check_range, check_url,
    normalize_text, optional, report_missing_ids, required, round1, FieldErrors, WriteMode,
    NON_FIELD_ERRORS,
};
use crate::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Query parameters for listing works. Empty values are ignored.
#[derive(Debug, Deserialize)]
pub struct ListObrasQuery {
    pub status: Option<String>,
    pub tipo: Option<String>,
    /// Case-insensitive title substring.
    pub search: Option<String>,
}

/// Request body for creating or updating a work.
///
/// Nullable fields distinguish "absent" (keep) from `null` (clear).
/// Relations are given as id arrays and replace the whole set.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObraPayload {
    #[serde(default, deserialize_with = "double_option")]
    pub titulo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sinopse: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ano_lancamento: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub duracao_minutos: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url_capa: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tipo: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nota_imdb: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_episodios: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_temporadas: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub episodio_atual: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub temporada_atual: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub comentario: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub data_assistido: Option<Option<String>>,
    pub diretores: Option<Vec<i64>>,
    pub generos: Option<Vec<i64>>,
    pub plataformas: Option<Vec<i64>>,
    pub tags: Option<Vec<i64>>,
}

/// Validated work fields, ready for INSERT/UPDATE.
struct ObraFields {
    titulo: String,
    sinopse: Option<String>,
    ano_lancamento: Option<i32>,
    duracao_minutos: Option<i32>,
    url_capa: Option<String>,
    tipo: TipoObra,
    status: StatusObra,
    nota_imdb: Option<f64>,
    total_episodios: Option<i32>,
    total_temporadas: Option<i32>,
    episodio_atual: Option<i32>,
    temporada_atual: Option<i32>,
    comentario: Option<String>,
    data_assistido: Option<String>,
    relations: Vec<(Relacao, Vec<i64>)>,
}

/// Catalog statistics.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Estatisticas {
    pub total_obras: i64,
    pub por_tipo: BTreeMap<String, i64>,
    pub por_status: BTreeMap<String, i64>,
    /// Runtime of watched works; series count runtime times episodes.
    pub minutos_assistidos: i64,
    pub media_duracao: BTreeMap<String, Option<f64>>,
    pub obras_por_ano: Vec<ObrasPorAno>,
    pub melhor_filme: Option<Obra>,
    pub filme_mais_longo: Option<Obra>,
    pub serie_mais_longa: Option<Obra>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ObrasPorAno {
    pub ano: i32,
    pub total: i64,
}

/// Query parameters for TMDB search.
#[derive(Debug, Deserialize)]
pub struct PesquisarTmdbQuery {
    pub query: Option<String>,
    pub page: Option<u32>,
}

/// Query parameters for TMDB details.
#[derive(Debug, Deserialize)]
pub struct TmdbDetailsQuery {
    pub tmdb_id: Option<i64>,
    pub tipo: Option<String>,
}

/// Request body for importing a work from TMDB.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportarTmdbRequest {
    pub tmdb_id: Option<i64>,
    pub tipo: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/obras
///
/// Lists works newest first, filtered by `status`, `tipo` and `search`.
#[utoipa::path(
    get,
    path = "/api/obras",
    params(
        ("status" = Option<String>, Query, description = "Watch status"),
        ("tipo" = Option<String>, Query, description = "`filme` or `serie`"),
        ("search" = Option<String>, Query, description = "Case-insensitive title substring"),
    ),
    responses(
        (status = 200, description = "Works, newest first", body = Vec<Obra>),
        (status = 400, description = "Invalid filter", body = ErrorBody),
    ),
    tag = "obras"
)]
pub async fn list_obras(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListObrasQuery>,
) -> Result<Json<Vec<Obra>>> {
    let filter = ObraFilter {
        status: parse_filter(query.status.as_deref(), "status")?,
        tipo: parse_filter(query.tipo.as_deref(), "tipo")?,
        search: query.search,
    };

    let db = state.db.lock().await;
    let obras = queries::list_obras(&db, &filter)?;

    Ok(Json(obras))
}

/// POST /api/obras
#[utoipa::path(
    post,
    path = "/api/obras",
    request_body = ObraPayload,
    responses(
        (status = 201, description = "Work created", body = Obra),
        (status = 400, description = "Validation failed", body = ErrorBody),
    ),
    tag = "obras"
)]
pub async fn create_obra(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ObraPayload>,
) -> Result<(StatusCode, Json<Obra>)> {
    let mut db = state.db.lock().await;

    let fields = validate(&db, body, WriteMode::Create, None)?;

    let tx = db.transaction()?;
    tx.execute(
        r#"
        INSERT INTO obras (
            titulo, sinopse, ano_lancamento, duracao_minutos, url_capa, tipo, status,
            nota_imdb, total_episodios, total_temporadas, episodio_atual, temporada_atual,
            comentario, data_assistido
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            fields.titulo,
            fields.sinopse,
            fields.ano_lancamento,
            fields.duracao_minutos,
            fields.url_capa,
            fields.tipo.to_string(),
            fields.status.to_string(),
            fields.nota_imdb,
            fields.total_episodios,
            fields.total_temporadas,
            fields.episodio_atual,
            fields.temporada_atual,
            fields.comentario,
            fields.data_assistido,
        ],
    )?;
    let obra_id = tx.last_insert_rowid();
    for (relacao, ids) in &fields.relations {
        queries::set_relations(&tx, *relacao, obra_id, ids)?;
    }
    let obra = queries::get_obra(&tx, obra_id)?;
    tx.commit()?;

    tracing::info!(
        obra_id = obra.id,
        titulo = %obra.titulo,
        tipo = %obra.tipo,
        "Work created"
    );

    Ok((StatusCode::CREATED, Json(obra)))
}

/// GET /api/obras/{id}
#[utoipa::path(
    get,
    path = "/api/obras/{id}",
    params(("id" = i64, Path, description = "Work id")),
    responses(
        (status = 200, description = "Work found", body = Obra),
        (status = 404, description = "Work not found", body = ErrorBody),
    ),
    tag = "obras"
)]
pub async fn get_obra(
    State(state): State<AppState>,
    ApiPath(obra_id): ApiPath<i64>,
) -> Result<Json<Obra>> {
    let db = state.db.lock().await;
    let obra = queries::get_obra(&db, obra_id).map_err(AppError::not_found_or("Work"))?;
    Ok(Json(obra))
}

/// PUT /api/obras/{id}
#[utoipa::path(
    put,
    path = "/api/obras/{id}",
    params(("id" = i64, Path, description = "Work id")),
    request_body = ObraPayload,
    responses(
        (status = 200, description = "Work replaced", body = Obra),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Work not found", body = ErrorBody),
    ),
    tag = "obras"
)]
pub async fn replace_obra(
    State(state): State<AppState>,
    ApiPath(obra_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ObraPayload>,
) -> Result<Json<Obra>> {
    save(&state, obra_id, body, WriteMode::Replace).await
}

/// PATCH /api/obras/{id}
#[utoipa::path(
    patch,
    path = "/api/obras/{id}",
    params(("id" = i64, Path, description = "Work id")),
    request_body = ObraPayload,
    responses(
        (status = 200, description = "Work updated", body = Obra),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Work not found", body = ErrorBody),
    ),
    tag = "obras"
)]
pub async fn patch_obra(
    State(state): State<AppState>,
    ApiPath(obra_id): ApiPath<i64>,
    ApiJson(body): ApiJson<ObraPayload>,
) -> Result<Json<Obra>> {
    save(&state, obra_id, body, WriteMode::Patch).await
}

/// DELETE /api/obras/{id}
///
/// Ratings and list memberships of the work are removed with it.
#[utoipa::path(
    delete,
    path = "/api/obras/{id}",
    params(("id" = i64, Path, description = "Work id")),
    responses(
        (status = 204, description = "Work deleted"),
        (status = 404, description = "Work not found", body = ErrorBody),
    ),
    tag = "obras"
)]
pub async fn delete_obra(
    State(state): State<AppState>,
    ApiPath(obra_id): ApiPath<i64>,
) -> Result<StatusCode> {
    let db = state.db.lock().await;

    if db.execute("DELETE FROM obras WHERE id = ?1", [obra_id])? == 0 {
        return Err(AppError::NotFound("Work not found.".to_string()));
    }

    tracing::info!(obra_id = obra_id, "Work deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/obras/estatisticas
///
/// Aggregated numbers over the whole catalog.
#[utoipa::path(
    get,
    path = "/api/obras/estatisticas",
    responses((status = 200, description = "Catalog statistics", body = Estatisticas)),
    tag = "obras"
)]
pub async fn estatisticas(State(state): State<AppState>) -> Result<Json<Estatisticas>> {
    let db = state.db.lock().await;
    Ok(Json(compute_estatisticas(&db)?))
}

/// GET /api/obras/pesquisar_tmdb?query=&page=
#[utoipa::path(
    get,
    path = "/api/obras/pesquisar_tmdb",
    params(
        ("query" = String, Query, description = "Search term"),
        ("page" = Option<u32>, Query, description = "Result page"),
    ),
    responses(
        (status = 200, description = "TMDB multi-search hits", body = Vec<TmdbSearchResult>),
        (status = 400, description = "Missing query", body = ErrorBody),
        (status = 502, description = "TMDB request failed", body = ErrorBody),
        (status = 503, description = "TMDB is not configured", body = ErrorBody),
    ),
    tag = "tmdb"
)]
pub async fn pesquisar_tmdb(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PesquisarTmdbQuery>,
) -> Result<Json<Vec<TmdbSearchResult>>> {
    let term = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Parameter 'query' is required.".to_string()))?;

    let tmdb = tmdb_client(&state)?;
    let results = tmdb.search_multi(term, query.page).await?;

    Ok(Json(results))
}

/// GET /api/obras/get_tmdb_details?tmdb_id=&tipo=
///
/// Raw TMDB details, for previewing before an import.
#[utoipa::path(
    get,
    path = "/api/obras/get_tmdb_details",
    params(
        ("tmdb_id" = i64, Query, description = "TMDB id"),
        ("tipo" = String, Query, description = "`movie` or `tv`"),
    ),
    responses(
        (status = 200, description = "TMDB details with credits", body = TmdbDetails),
        (status = 400, description = "Invalid parameters", body = ErrorBody),
        (status = 404, description = "Unknown TMDB id", body = ErrorBody),
        (status = 502, description = "TMDB request failed", body = ErrorBody),
        (status = 503, description = "TMDB is not configured", body = ErrorBody),
    ),
    tag = "tmdb"
)]
pub async fn get_tmdb_details(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TmdbDetailsQuery>,
) -> Result<Json<TmdbDetails>> {
    let (Some(tmdb_id), Some(tipo)) = (query.tmdb_id, query.tipo.as_deref()) else {
        return Err(AppError::BadRequest(
            "Parameters 'tmdb_id' and 'tipo' are required.".to_string(),
        ));
    };
    let media: TmdbMediaType = tipo.parse()?;

    let tmdb = tmdb_client(&state)?;
    let details = tmdb.get_details(tmdb_id, media).await?;

    Ok(Json(details))
}

/// POST /api/obras/importar_tmdb
///
/// Creates a work from TMDB metadata, creating missing genres and directors.
#[utoipa::path(
    post,
    path = "/api/obras/importar_tmdb",
    request_body = ImportarTmdbRequest,
    responses(
        (status = 201, description = "Work imported", body = Obra),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Unknown TMDB id", body = ErrorBody),
        (status = 502, description = "TMDB request failed", body = ErrorBody),
        (status = 503, description = "TMDB is not configured", body = ErrorBody),
    ),
    tag = "tmdb"
)]
pub async fn importar_tmdb(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ImportarTmdbRequest>,
) -> Result<(StatusCode, Json<Obra>)> {
    let mut errors = FieldErrors::new();

    match body.tmdb_id {
        None => errors.add("tmdbId", "This field is required."),
        Some(id) if id <= 0 => errors.add("tmdbId", "Ensure this value is greater than 0."),
        Some(_) => {}
    }
    let media = match body.tipo.as_deref() {
        None => {
            errors.add("tipo", "This field is required.");
            None
        }
        Some(tipo) => match tipo.parse::<TmdbMediaType>() {
            Ok(media) => Some(media),
            Err(_) => {
                errors.add("tipo", format!("\"{}\" is not a valid choice.", tipo));
                None
            }
        },
    };
    errors.into_result()?;

    let (Some(tmdb_id), Some(media)) = (body.tmdb_id, media) else {
        return Err(AppError::Internal("import parameters lost after validation".to_string()));
    };

    let tmdb = tmdb_client(&state)?;
    let obra = importer::import_work(&state.db, tmdb, tmdb_id, media).await?;

    Ok((StatusCode::CREATED, Json(obra)))
}

// =============================================================================
// Helpers
// =============================================================================

fn tmdb_client(state: &AppState) -> Result<&dyn TmdbApi> {
    state
        .tmdb_client()
        .ok_or_else(|| AppError::Unavailable("TMDB integration is not configured.".to_string()))
}

async fn save(
    state: &AppState,
    obra_id: i64,
    body: ObraPayload,
    mode: WriteMode,
) -> Result<Json<Obra>> {
    let mut db = state.db.lock().await;

    let current = queries::get_obra(&db, obra_id).map_err(AppError::not_found_or("Work"))?;
    let fields = validate(&db, body, mode, Some(&current))?;

    let tx = db.transaction()?;
    tx.execute(
        r#"
        UPDATE obras SET
            titulo = ?1, sinopse = ?2, ano_lancamento = ?3, duracao_minutos = ?4,
            url_capa = ?5, tipo = ?6, status = ?7, nota_imdb = ?8, total_episodios = ?9,
            total_temporadas = ?10, episodio_atual = ?11, temporada_atual = ?12,
            comentario = ?13, data_assistido = ?14, updated_at = datetime('now')
        WHERE id = ?15
        "#,
        params![
            fields.titulo,
            fields.sinopse,
            fields.ano_lancamento,
            fields.duracao_minutos,
            fields.url_capa,
            fields.tipo.to_string(),
            fields.status.to_string(),
            fields.nota_imdb,
            fields.total_episodios,
            fields.total_temporadas,
            fields.episodio_atual,
            fields.temporada_atual,
            fields.comentario,
            fields.data_assistido,
            obra_id,
        ],
    )?;
    for (relacao, ids) in &fields.relations {
        queries::set_relations(&tx, *relacao, obra_id, ids)?;
    }
    let obra = queries::get_obra(&tx, obra_id)?;
    tx.commit()?;

    tracing::info!(obra_id = obra_id, status = %obra.status, "Work updated");

    Ok(Json(obra))
}

/// Parses a choice field, reporting unknown values on `field`.
fn choice<T: std::str::FromStr>(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<T> {
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, format!("\"{}\" is not a valid choice.", raw));
            None
        }
    }
}

fn validate(
    conn: &Connection,
    body: ObraPayload,
    mode: WriteMode,
    current: Option<&Obra>,
) -> Result<ObraFields> {
    let mut errors = FieldErrors::new();

    let titulo = required(
        &mut errors,
        "titulo",
        mode,
        body.titulo.map(|t| t.map(|t| t.trim().to_string())),
        current.map(|c| c.titulo.clone()),
    );
    check_not_blank(&mut errors, "titulo", titulo.as_deref());
    check_max_len(&mut errors, "titulo", titulo.as_deref(), 255);

    let sinopse = optional(
        body.sinopse.map(normalize_text),
        current.and_then(|c| c.sinopse.clone()),
    );
    check_max_len(&mut errors, "sinopse", sinopse.as_deref(), 5000);

    let ano_lancamento = optional(body.ano_lancamento, current.and_then(|c| c.ano_lancamento));
    check_range(&mut errors, "anoLancamento", ano_lancamento, 1900, 2100);

    let duracao_minutos = optional(body.duracao_minutos, current.and_then(|c| c.duracao_minutos));
    check_min(&mut errors, "duracaoMinutos", duracao_minutos, 1);

    let url_capa = optional(
        body.url_capa.map(normalize_text),
        current.and_then(|c| c.url_capa.clone()),
    );
    check_url(&mut errors, "urlCapa", url_capa.as_deref(), 255);

    // An invalid choice was already reported, so it must not count as missing.
    let tipo = match body.tipo {
        Some(Some(raw)) => choice::<TipoObra>(&mut errors, "tipo", &raw),
        incoming => required(
            &mut errors,
            "tipo",
            mode,
            incoming.map(|_| None),
            current.map(|c| c.tipo),
        ),
    };
    let status = match body.status {
        Some(Some(raw)) => choice::<StatusObra>(&mut errors, "status", &raw),
        incoming => required(
            &mut errors,
            "status",
            mode,
            incoming.map(|_| None),
            current.map(|c| c.status),
        ),
    };

    let nota_imdb = optional(body.nota_imdb, current.and_then(|c| c.nota_imdb));
    check_finite(&mut errors, "notaImdb", nota_imdb);
    check_range(&mut errors, "notaImdb", nota_imdb, 0.0, 10.0);

    let total_episodios = optional(body.total_episodios, current.and_then(|c| c.total_episodios));
    check_min(&mut errors, "totalEpisodios", total_episodios, 1);
    let total_temporadas =
        optional(body.total_temporadas, current.and_then(|c| c.total_temporadas));
    check_min(&mut errors, "totalTemporadas", total_temporadas, 1);
    let episodio_atual = optional(body.episodio_atual, current.and_then(|c| c.episodio_atual));
    check_min(&mut errors, "episodioAtual", episodio_atual, 0);
    let temporada_atual = optional(body.temporada_atual, current.and_then(|c| c.temporada_atual));
    check_min(&mut errors, "temporadaAtual", temporada_atual, 0);

    if tipo == Some(TipoObra::Serie) {
        check_progress(
            &mut errors,
            episodio_atual,
            total_episodios,
            "Current episode cannot be greater than the total number of episodes.",
        );
        check_progress(
            &mut errors,
            temporada_atual,
            total_temporadas,
            "Current season cannot be greater than the total number of seasons.",
        );
    }

    let comentario = optional(
        body.comentario.map(normalize_text),
        current.and_then(|c| c.comentario.clone()),
    );
    check_max_len(&mut errors, "comentario", comentario.as_deref(), 2000);

    let data_assistido = optional(
        body.data_assistido.map(normalize_text),
        current.and_then(|c| c.data_assistido.clone()),
    );
    let data_assistido = match data_assistido {
        Some(raw) => match chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
            Err(_) => {
                errors.add(
                    "dataAssistido",
                    "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
                );
                None
            }
        },
        None => None,
    };

    let mut relations = Vec::new();
    for (relacao, field, ids) in [
        (Relacao::Diretores, "diretores", body.diretores),
        (Relacao::Generos, "generos", body.generos),
        (Relacao::Plataformas, "plataformas", body.plataformas),
        (Relacao::Tags, "tags", body.tags),
    ] {
        match ids {
            Some(ids) => {
                report_missing_ids(
                    &mut errors,
                    field,
                    &queries::missing_ids(conn, relacao.table(), &ids)?,
                );
                relations.push((relacao, ids));
            }
            // A new work starts without relations; updates keep the stored set.
            None if mode == WriteMode::Create => relations.push((relacao, Vec::new())),
            None => {}
        }
    }

    errors.into_result()?;

    let (Some(titulo), Some(tipo), Some(status)) = (titulo, tipo, status) else {
        return Err(AppError::Internal("work fields lost after validation".to_string()));
    };

    Ok(ObraFields {
        titulo,
        sinopse,
        ano_lancamento,
        duracao_minutos,
        url_capa,
        tipo,
        status,
        nota_imdb: nota_imdb.map(round1),
        total_episodios,
        total_temporadas,
        episodio_atual,
        temporada_atual,
        comentario,
        data_assistido,
        relations,
    })
}

/// Current progress may not pass the total once both are known and non-zero.
fn check_progress(
    errors: &mut FieldErrors,
    atual: Option<i32>,
    total: Option<i32>,
    message: &str,
) {
    if let (Some(atual), Some(total)) = (atual, total) {
        if atual > 0 && total > 0 && atual > total {
            errors.add(NON_FIELD_ERRORS, message);
        }
    }
}

fn compute_estatisticas(conn: &Connection) -> Result<Estatisticas> {
    let total_obras: i64 = conn.query_row("SELECT COUNT(*) FROM obras", [], |row| row.get(0))?;

    let mut por_tipo: BTreeMap<String, i64> = [TipoObra::Filme, TipoObra::Serie]
        .iter()
        .map(|t| (t.to_string(), 0))
        .collect();
    let mut media_duracao: BTreeMap<String, Option<f64>> =
        por_tipo.keys().map(|k| (k.clone(), None)).collect();
    let mut stmt =
        conn.prepare("SELECT tipo, COUNT(*), AVG(duracao_minutos) FROM obras GROUP BY tipo")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<f64>>(2)?,
        ))
    })?;
    for row in rows {
        let (tipo, total, media) = row?;
        media_duracao.insert(tipo.clone(), media.map(round1));
        por_tipo.insert(tipo, total);
    }

    let mut por_status: BTreeMap<String, i64> =
        StatusObra::ALL.iter().map(|s| (s.to_string(), 0)).collect();
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM obras GROUP BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (status, total) = row?;
        por_status.insert(status, total);
    }

    let minutos_assistidos: i64 = conn.query_row(
        r#"
        SELECT COALESCE(SUM(
            CASE WHEN tipo = 'serie'
                 THEN duracao_minutos * COALESCE(total_episodios, 1)
                 ELSE duracao_minutos
            END), 0)
        FROM obras
        WHERE status = 'assistido' AND duracao_minutos IS NOT NULL
        "#,
        [],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        r#"
        SELECT ano_lancamento, COUNT(*) FROM obras
        WHERE ano_lancamento IS NOT NULL
        GROUP BY ano_lancamento
        ORDER BY ano_lancamento DESC
        "#,
    )?;
    let obras_por_ano = stmt
        .query_map([], |row| {
            Ok(ObrasPorAno {
                ano: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let melhor_filme = top_obra(
        conn,
        "tipo = 'filme' AND nota_imdb IS NOT NULL",
        "nota_imdb DESC",
    )?;
    let filme_mais_longo = top_obra(
        conn,
        "tipo = 'filme' AND duracao_minutos IS NOT NULL",
        "duracao_minutos DESC",
    )?;
    let serie_mais_longa = top_obra(
        conn,
        "tipo = 'serie' AND total_episodios IS NOT NULL",
        "total_episodios DESC, COALESCE(total_temporadas, 0) DESC",
    )?;

    Ok(Estatisticas {
        total_obras,
        por_tipo,
        por_status,
        minutos_assistidos,
        media_duracao,
        obras_por_ano,
        melhor_filme,
        filme_mais_longo,
        serie_mais_longa,
    })
}

/// First work matching `condition` under `order`; ties go to the oldest entry.
fn top_obra(conn: &Connection, condition: &str, order: &str) -> Result<Option<Obra>> {
    let id: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT id FROM obras WHERE {} ORDER BY {}, id LIMIT 1",
                condition, order
            ),
            [],
            |row| row.get(0),
        )
        .optional()?;

    match id {
        Some(id) => Ok(Some(queries::get_obra(conn, id)?)),
        None => Ok(None),
    }
}
