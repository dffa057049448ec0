//! OpenAPI document for the catalog API.

use axum::Json;
use utoipa::OpenApi;

use super::{avaliacoes, diretores, generos, listas, obras, plataformas, tags};
use crate::db::models::{
    Avaliacao, Diretor, Genero, Lista, Obra, Plataforma, StatusObra, Tag, TipoObra,
};
use crate::error::ErrorBody;
use crate::services::tmdb::{TmdbDetails, TmdbSearchResult};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Moviendo API",
        description = "Movie and series catalog with TMDB import"
    ),
    paths(
        crate::health_check,
        obras::list_obras,
        obras::create_obra,
        obras::get_obra,
        obras::replace_obra,
        obras::patch_obra,
        obras::delete_obra,
        obras::estatisticas,
        obras::pesquisar_tmdb,
        obras::get_tmdb_details,
        obras::importar_tmdb,
        diretores::list_diretores,
        diretores::create_diretor,
        diretores::get_diretor,
        diretores::replace_diretor,
        diretores::patch_diretor,
        diretores::delete_diretor,
        generos::list_generos,
        generos::create_genero,
        generos::get_genero,
        generos::replace_genero,
        generos::patch_genero,
        generos::delete_genero,
        plataformas::list_plataformas,
        plataformas::create_plataforma,
        plataformas::get_plataforma,
        plataformas::replace_plataforma,
        plataformas::patch_plataforma,
        plataformas::delete_plataforma,
        tags::list_tags,
        tags::create_tag,
        tags::get_tag,
        tags::replace_tag,
        tags::patch_tag,
        tags::delete_tag,
        avaliacoes::list_avaliacoes,
        avaliacoes::list_avaliacoes_obra,
        avaliacoes::create_avaliacao,
        avaliacoes::get_avaliacao,
        avaliacoes::replace_avaliacao,
        avaliacoes::patch_avaliacao,
        avaliacoes::delete_avaliacao,
        listas::list_listas,
        listas::create_lista,
        listas::get_lista,
        listas::replace_lista,
        listas::patch_lista,
        listas::delete_lista,
        listas::add_obra,
        listas::remove_obra,
    ),
    tags(
        (name = "obras", description = "Movies and series"),
        (name = "tmdb", description = "TMDB search and import"),
        (name = "diretores", description = "Directors"),
        (name = "generos", description = "Genres"),
        (name = "plataformas", description = "Streaming platforms"),
        (name = "tags", description = "Free-form labels"),
        (name = "avaliacoes", description = "Ratings"),
        (name = "listas", description = "User-curated lists"),
        (name = "health", description = "Liveness")
    ),
    components(schemas(
        Obra,
        TipoObra,
        StatusObra,
        Diretor,
        Genero,
        Plataforma,
        Tag,
        Avaliacao,
        Lista,
        obras::ObraPayload,
        obras::Estatisticas,
        obras::ObrasPorAno,
        obras::ImportarTmdbRequest,
        diretores::DiretorPayload,
        generos::GeneroPayload,
        plataformas::PlataformaPayload,
        tags::TagPayload,
        avaliacoes::AvaliacaoPayload,
        listas::ListaPayload,
        TmdbSearchResult,
        TmdbDetails,
        ErrorBody
    ))
)]
pub struct ApiDoc;

/// GET /api/schema
pub async fn schema() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
