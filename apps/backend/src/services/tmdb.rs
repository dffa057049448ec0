//! TMDB (The Movie Database) service client.
//!
//! Provides methods to search and fetch movie/TV show metadata from TMDB API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::sync::Arc;
use std::time::Duration;

use crate::config::TmdbConfig;
use crate::error::{AppError, Result};

/// TMDB media kinds the catalog can import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TmdbMediaType {
    Movie,
    Tv,
}

impl TmdbMediaType {
    fn path_segment(self) -> &'static str {
        match self {
            TmdbMediaType::Movie => "movie",
            TmdbMediaType::Tv => "tv",
        }
    }
}

impl std::fmt::Display for TmdbMediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl std::str::FromStr for TmdbMediaType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "movie" => Ok(TmdbMediaType::Movie),
            "tv" => Ok(TmdbMediaType::Tv),
            _ => Err(AppError::BadRequest(
                "tipo must be 'movie' or 'tv'".to_string(),
            )),
        }
    }
}

/// Read-only access to TMDB, the seam the importer and handlers depend on.
#[async_trait]
pub trait TmdbApi: Send + Sync {
    /// Searches movies, shows and people by name (`/search/multi`).
    async fn search_multi(&self, query: &str, page: Option<u32>) -> Result<Vec<TmdbSearchResult>>;

    /// Fetches full details of a movie or show, credits included.
    async fn get_details(&self, tmdb_id: i64, media: TmdbMediaType) -> Result<TmdbDetails>;

    /// Base URL for poster images, e.g. `https://image.tmdb.org/t/p`.
    fn image_base_url(&self) -> &str;
}

#[derive(Clone)]
enum Credentials {
    ApiKey(String),
    Bearer(String),
}

/// TMDB API client for fetching movie and TV show metadata.
pub struct TmdbClient {
    client: Client,
    credentials: Credentials,
    base_url: String,
    image_base_url: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client from configuration.
    ///
    /// Returns an error if no credential is set or if the HTTP client cannot be built.
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let non_blank = |v: &Option<String>| {
            v.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let credentials = match (non_blank(&config.access_token), non_blank(&config.api_key)) {
            (Some(token), _) => Credentials::Bearer(token),
            (None, Some(key)) => Credentials::ApiKey(key),
            (None, None) => {
                return Err(AppError::Internal(
                    "TMDB API key cannot be empty".to_string(),
                ))
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    /// Create a new TMDB client wrapped in Arc for shared access.
    pub fn new_shared(config: &TmdbConfig) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::new(config)?))
    }

    /// Internal helper to perform GET requests with query parameters and deserialize JSON responses.
    async fn get_with_params<T>(&self, path: &str, params: &[(&str, String)]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .get(&url)
            .query(&[("language", self.language.as_str())])
            .query(params);

        request = match &self.credentials {
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::ApiKey(key) => request.query(&[("api_key", key.as_str())]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("TMDB request to {} failed: {}", path, e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::Upstream(
                "TMDB API key is invalid or missing".to_string(),
            ));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "TMDB resource not found: {}",
                path
            )));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::Upstream(
                "TMDB rate limit exceeded, please try again later".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "TMDB API {} returned error status: {}",
                path, status
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::Upstream(format!(
                "Failed to parse TMDB response from {}: {}",
                path, e
            ))
        })
    }
}

#[async_trait]
impl TmdbApi for TmdbClient {
    async fn search_multi(&self, query: &str, page: Option<u32>) -> Result<Vec<TmdbSearchResult>> {
        tracing::debug!(query = %query, page = ?page, "Searching TMDB");

        let mut params = vec![("query", query.to_string())];
        if let Some(page) = page {
            params.push(("page", page.to_string()));
        }

        let response: TmdbSearchResponse<TmdbSearchResult> =
            self.get_with_params("/search/multi", &params).await?;
        Ok(response.results)
    }

    async fn get_details(&self, tmdb_id: i64, media: TmdbMediaType) -> Result<TmdbDetails> {
        tracing::debug!(tmdb_id = tmdb_id, media = %media, "Fetching TMDB details");

        let params = [("append_to_response", "credits".to_string())];
        self.get_with_params(&format!("/{}/{}", media.path_segment(), tmdb_id), &params)
            .await
    }

    fn image_base_url(&self) -> &str {
        &self.image_base_url
    }
}

/// Generate a poster URL for the given path and size.
///
/// Common sizes: "w92", "w154", "w185", "w342", "w500", "w780", "original"
pub fn poster_url(image_base_url: &str, path: &str, size: &str) -> String {
    format!("{}/{}{}", image_base_url, size, path)
}

// =============================================================================
// Response Types
// =============================================================================

/// Generic search response wrapper from TMDB API.
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse<T> {
    pub results: Vec<T>,
    /// Current page number (for pagination support).
    #[allow(dead_code)]
    #[serde(default)]
    pub page: i32,
    /// Total number of pages available.
    #[allow(dead_code)]
    #[serde(default)]
    pub total_pages: i32,
}

/// Multi-search hit: a movie, a show or a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TmdbSearchResult {
    pub id: i64,
    pub media_type: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub original_title: Option<String>,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
}

/// Movie or TV details with appended credits.
///
/// Movie-only and TV-only fields are optional so one type covers both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TmdbDetails {
    pub id: i64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub runtime: Option<i32>,
    #[serde(default)]
    pub episode_run_time: Vec<i32>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub created_by: Vec<TmdbPerson>,
    pub credits: Option<TmdbCredits>,
}

/// Genre information from TMDB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

/// Show creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TmdbPerson {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TmdbCredits {
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TmdbCrewMember {
    pub id: i64,
    pub name: String,
    pub job: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(api_key: Option<&str>, access_token: Option<&str>) -> TmdbConfig {
        TmdbConfig {
            api_key: api_key.map(String::from),
            access_token: access_token.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_poster_url() {
        let url = poster_url("https://image.tmdb.org/t/p", "/abc123.jpg", "w500");
        assert_eq!(url, "https://image.tmdb.org/t/p/w500/abc123.jpg");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = TmdbClient::new(&config_with(Some(""), None));
        assert!(result.is_err());
    }

    #[test]
    fn test_whitespace_api_key_rejected() {
        let result = TmdbClient::new(&config_with(Some("   "), None));
        assert!(result.is_err());
    }

    #[test]
    fn test_access_token_preferred() {
        let client = TmdbClient::new(&config_with(Some("key"), Some("token"))).unwrap();
        assert!(matches!(client.credentials, Credentials::Bearer(ref t) if t == "token"));
    }

    #[test]
    fn test_image_base_trailing_slash_trimmed() {
        let mut config = config_with(Some("key"), None);
        config.image_base_url = "https://image.tmdb.org/t/p/".to_string();
        let client = TmdbClient::new(&config).unwrap();
        assert_eq!(client.image_base_url(), "https://image.tmdb.org/t/p");
    }

    #[test]
    fn test_media_type_parse() {
        assert_eq!("tv".parse::<TmdbMediaType>().unwrap(), TmdbMediaType::Tv);
        assert!("person".parse::<TmdbMediaType>().is_err());
    }

    #[test]
    fn test_movie_details_deserialize() {
        let json = r#"{
            "id": 603,
            "title": "The Matrix",
            "release_date": "1999-03-30",
            "runtime": 136,
            "vote_average": 8.218,
            "poster_path": "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
            "genres": [{"id": 28, "name": "Action"}],
            "credits": {"crew": [
                {"id": 9339, "name": "Lilly Wachowski", "job": "Director"},
                {"id": 1, "name": "Someone", "job": "Producer"}
            ]}
        }"#;

        let details: TmdbDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.title.as_deref(), Some("The Matrix"));
        assert_eq!(details.runtime, Some(136));
        assert!(details.episode_run_time.is_empty());
        assert_eq!(details.credits.unwrap().crew.len(), 2);
    }

    #[test]
    fn test_tv_details_deserialize() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "first_air_date": "2008-01-20",
            "episode_run_time": [45, 47],
            "number_of_seasons": 5,
            "number_of_episodes": 62,
            "created_by": [{"id": 66633, "name": "Vince Gilligan"}],
            "genres": []
        }"#;

        let details: TmdbDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.name.as_deref(), Some("Breaking Bad"));
        assert_eq!(details.episode_run_time, vec![45, 47]);
        assert_eq!(details.created_by[0].name, "Vince Gilligan");
        assert!(details.credits.is_none());
    }
}
