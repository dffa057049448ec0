//! API endpoint handlers and router assembly for the Moviendo backend.

use axum::{
    http::{header, Method},
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::{health_check, middleware, AppState};

pub mod avaliacoes;
pub mod diretores;
pub mod extract;
pub mod generos;
pub mod listas;
pub mod obras;
pub mod openapi;
pub mod plataformas;
pub mod tags;

/// Builds the complete application router.
///
/// Shared by `main.rs` and the integration tests so both run the same routes.
pub fn router(state: AppState) -> Router {
    let diretores_routes = Router::new()
        .route(
            "/",
            get(diretores::list_diretores).post(diretores::create_diretor),
        )
        .route(
            "/{id}",
            get(diretores::get_diretor)
                .put(diretores::replace_diretor)
                .patch(diretores::patch_diretor)
                .delete(diretores::delete_diretor),
        );

    let generos_routes = Router::new()
        .route("/", get(generos::list_generos).post(generos::create_genero))
        .route(
            "/{id}",
            get(generos::get_genero)
                .put(generos::replace_genero)
                .patch(generos::patch_genero)
                .delete(generos::delete_genero),
        );

    let plataformas_routes = Router::new()
        .route(
            "/",
            get(plataformas::list_plataformas).post(plataformas::create_plataforma),
        )
        .route(
            "/{id}",
            get(plataformas::get_plataforma)
                .put(plataformas::replace_plataforma)
                .patch(plataformas::patch_plataforma)
                .delete(plataformas::delete_plataforma),
        );

    let tags_routes = Router::new()
        .route("/", get(tags::list_tags).post(tags::create_tag))
        .route(
            "/{id}",
            get(tags::get_tag)
                .put(tags::replace_tag)
                .patch(tags::patch_tag)
                .delete(tags::delete_tag),
        );

    // Static segments win over `/{id}` in the router, so the TMDB actions can
    // live next to the work routes.
    let obras_routes = Router::new()
        .route("/", get(obras::list_obras).post(obras::create_obra))
        .route("/estatisticas", get(obras::estatisticas))
        .route("/pesquisar_tmdb", get(obras::pesquisar_tmdb))
        .route("/get_tmdb_details", get(obras::get_tmdb_details))
        .route("/importar_tmdb", post(obras::importar_tmdb))
        .route(
            "/{id}",
            get(obras::get_obra)
                .put(obras::replace_obra)
                .patch(obras::patch_obra)
                .delete(obras::delete_obra),
        );

    let avaliacoes_routes = Router::new()
        .route(
            "/",
            get(avaliacoes::list_avaliacoes).post(avaliacoes::create_avaliacao),
        )
        .route("/obra/{obra_id}", get(avaliacoes::list_avaliacoes_obra))
        .route(
            "/{id}",
            get(avaliacoes::get_avaliacao)
                .put(avaliacoes::replace_avaliacao)
                .patch(avaliacoes::patch_avaliacao)
                .delete(avaliacoes::delete_avaliacao),
        );

    let listas_routes = Router::new()
        .route("/", get(listas::list_listas).post(listas::create_lista))
        .route(
            "/{id}",
            get(listas::get_lista)
                .put(listas::replace_lista)
                .patch(listas::patch_lista)
                .delete(listas::delete_lista),
        )
        .route(
            "/{id}/obras/{obra_id}",
            post(listas::add_obra).delete(listas::remove_obra),
        );

    let cors = cors_layer(&state.config.server);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/diretores", diretores_routes)
        .nest("/api/generos", generos_routes)
        .nest("/api/plataformas", plataformas_routes)
        .nest("/api/tags", tags_routes)
        .nest("/api/obras", obras_routes)
        .nest("/api/avaliacoes", avaliacoes_routes)
        .nest("/api/listas", listas_routes)
        .route("/api/schema", get(openapi::schema))
        .merge(Scalar::with_url("/api/docs", openapi::ApiDoc::openapi()))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(axum_mw::from_fn(middleware::error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("The requested resource was not found.".to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Configure CORS from the allowed origins. No origins means any origin.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

    if server.cors_origins.is_empty() {
        tracing::info!("CORS: No origins configured, allowing any origin");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(std::time::Duration::from_secs(3600))
    } else {
        let origins: Vec<_> = server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        tracing::info!("CORS: Allowing origins {:?}", server.cors_origins);
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    }
}
