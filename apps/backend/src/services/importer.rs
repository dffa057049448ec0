//! Imports a TMDB movie or show into the local catalog.
//!
//! The HTTP fetch happens before the database lock is taken; everything that
//! touches SQLite then runs in a single transaction.

use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use super::tmdb::{poster_url, TmdbApi, TmdbDetails, TmdbMediaType};
use crate::db::models::{Obra, StatusObra, TipoObra};
use crate::db::queries::{self, Relacao};
use crate::error::{AppError, Result};
use crate::validation::{round1, FieldErrors};

const POSTER_SIZE: &str = "w500";

/// Work fields extracted from a TMDB payload, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedWork {
    pub titulo: String,
    pub sinopse: Option<String>,
    pub ano_lancamento: Option<i32>,
    pub duracao_minutos: Option<i32>,
    pub url_capa: Option<String>,
    pub tipo: TipoObra,
    pub nota_imdb: Option<f64>,
    pub total_temporadas: Option<i32>,
    pub total_episodios: Option<i32>,
    pub generos: Vec<String>,
    pub diretores: Vec<ImportedDirector>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDirector {
    pub tmdb_id: i64,
    pub nome: String,
}

impl ImportedDirector {
    fn biografia(&self) -> String {
        format!("Imported from TMDB ID {}", self.tmdb_id)
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Year prefix of a TMDB date (`"1999-03-30"` -> 1999).
fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.split('-').next())
        .and_then(|y| y.parse::<i32>().ok())
        .filter(|y| (1900..=2100).contains(y))
}

fn positive(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v > 0)
}

/// Maps TMDB details onto catalog fields.
///
/// Fails with a validation error when TMDB has no usable title.
pub fn map_details(
    details: &TmdbDetails,
    media: TmdbMediaType,
    image_base_url: &str,
) -> Result<ImportedWork> {
    let (titulo, data, duracao, tipo) = match media {
        TmdbMediaType::Movie => (
            details.title.as_deref(),
            details.release_date.as_deref(),
            details.runtime,
            TipoObra::Filme,
        ),
        TmdbMediaType::Tv => (
            details.name.as_deref(),
            details.first_air_date.as_deref(),
            details.episode_run_time.first().copied(),
            TipoObra::Serie,
        ),
    };

    let titulo = titulo.map(str::trim).unwrap_or_default();
    if titulo.is_empty() {
        let mut errors = FieldErrors::new();
        errors.add("titulo", "TMDB returned an empty title.");
        return Err(AppError::Validation(errors));
    }

    let diretores = match media {
        TmdbMediaType::Movie => details
            .credits
            .iter()
            .flat_map(|c| c.crew.iter())
            .filter(|m| m.job.as_deref() == Some("Director"))
            .map(|m| (m.id, m.name.as_str()))
            .collect::<Vec<_>>(),
        TmdbMediaType::Tv => details
            .created_by
            .iter()
            .map(|p| (p.id, p.name.as_str()))
            .collect(),
    };

    let is_tv = media == TmdbMediaType::Tv;

    Ok(ImportedWork {
        titulo: truncate_chars(titulo, 255),
        sinopse: details
            .overview
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_chars(s, 5000)),
        ano_lancamento: year_of(data),
        duracao_minutos: positive(duracao),
        url_capa: details
            .poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| poster_url(image_base_url, p, POSTER_SIZE)),
        tipo,
        nota_imdb: details
            .vote_average
            .filter(|v| v.is_finite())
            .map(|v| round1(v.clamp(0.0, 10.0))),
        total_temporadas: if is_tv {
            positive(details.number_of_seasons)
        } else {
            None
        },
        total_episodios: if is_tv {
            positive(details.number_of_episodes)
        } else {
            None
        },
        generos: details
            .genres
            .iter()
            .map(|g| g.name.trim())
            .filter(|n| !n.is_empty())
            .map(|n| truncate_chars(n, 100))
            .collect(),
        diretores: diretores
            .into_iter()
            .map(|(id, nome)| (id, nome.trim()))
            .filter(|(_, nome)| !nome.is_empty())
            .map(|(tmdb_id, nome)| ImportedDirector {
                tmdb_id,
                nome: truncate_chars(nome, 255),
            })
            .collect(),
    })
}

/// Stores a mapped work with its genres and directors in one transaction.
pub fn store(conn: &mut Connection, work: &ImportedWork) -> Result<Obra> {
    let tx = conn.transaction()?;

    tx.execute(
        r#"
        INSERT INTO obras (
            titulo, sinopse, ano_lancamento, duracao_minutos, url_capa,
            tipo, status, nota_imdb, total_temporadas, total_episodios
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            work.titulo,
            work.sinopse,
            work.ano_lancamento,
            work.duracao_minutos,
            work.url_capa,
            work.tipo.to_string(),
            StatusObra::QueroAssistir.to_string(),
            work.nota_imdb,
            work.total_temporadas,
            work.total_episodios,
        ],
    )?;
    let obra_id = tx.last_insert_rowid();

    for nome in &work.generos {
        let genero_id = queries::get_or_create_genero(&tx, nome)?;
        queries::link(&tx, Relacao::Generos, obra_id, genero_id)?;
    }

    for diretor in &work.diretores {
        let biografia = diretor.biografia();
        let diretor_id =
            queries::get_or_create_diretor(&tx, &diretor.nome, Some(biografia.as_str()))?;
        queries::link(&tx, Relacao::Diretores, obra_id, diretor_id)?;
    }

    let obra = queries::get_obra(&tx, obra_id)?;
    tx.commit()?;
    Ok(obra)
}

/// Fetches `tmdb_id` from TMDB and stores it as a new work.
pub async fn import_work(
    db: &Mutex<Connection>,
    tmdb: &dyn TmdbApi,
    tmdb_id: i64,
    media: TmdbMediaType,
) -> Result<Obra> {
    if tmdb_id <= 0 {
        return Err(AppError::BadRequest("Invalid TMDB ID".to_string()));
    }

    let details = tmdb.get_details(tmdb_id, media).await?;
    let work = map_details(&details, media, tmdb.image_base_url())?;

    let mut conn = db.lock().await;
    let obra = store(&mut conn, &work)?;

    tracing::info!(
        obra_id = obra.id,
        tmdb_id = tmdb_id,
        titulo = %obra.titulo,
        generos = obra.generos.len(),
        diretores = obra.diretores.len(),
        "Work imported from TMDB"
    );

    Ok(obra)
}
