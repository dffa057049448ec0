use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of work tracked in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TipoObra {
    Filme,
    Serie,
}

impl std::fmt::Display for TipoObra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TipoObra::Filme => write!(f, "filme"),
            TipoObra::Serie => write!(f, "serie"),
        }
    }
}

impl std::str::FromStr for TipoObra {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filme" => Ok(TipoObra::Filme),
            "serie" => Ok(TipoObra::Serie),
            other => Err(format!("Unknown work type: {}", other)),
        }
    }
}

/// Watch progress of a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusObra {
    QueroAssistir,
    Assistindo,
    Assistido,
    Pausado,
    Abandonado,
}

impl StatusObra {
    pub const ALL: [StatusObra; 5] = [
        StatusObra::QueroAssistir,
        StatusObra::Assistindo,
        StatusObra::Assistido,
        StatusObra::Pausado,
        StatusObra::Abandonado,
    ];
}

impl std::fmt::Display for StatusObra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusObra::QueroAssistir => write!(f, "quero_assistir"),
            StatusObra::Assistindo => write!(f, "assistindo"),
            StatusObra::Assistido => write!(f, "assistido"),
            StatusObra::Pausado => write!(f, "pausado"),
            StatusObra::Abandonado => write!(f, "abandonado"),
        }
    }
}

impl std::str::FromStr for StatusObra {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quero_assistir" => Ok(StatusObra::QueroAssistir),
            "assistindo" => Ok(StatusObra::Assistindo),
            "assistido" => Ok(StatusObra::Assistido),
            "pausado" => Ok(StatusObra::Pausado),
            "abandonado" => Ok(StatusObra::Abandonado),
            other => Err(format!("Unknown work status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diretor {
    pub id: i64,
    pub nome: String,
    pub biografia: Option<String>,
    pub url_foto: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Genero {
    pub id: i64,
    pub nome: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plataforma {
    pub id: i64,
    pub nome: String,
    pub logo: Option<String>,
    pub cor: Option<String>,
    pub url: Option<String>,
    pub ativa: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub nome: String,
    pub cor: Option<String>,
    pub created_at: String,
}

/// A movie or series with its related entities resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Obra {
    pub id: i64,
    pub titulo: String,
    pub sinopse: Option<String>,
    pub ano_lancamento: Option<i32>,
    pub duracao_minutos: Option<i32>,
    pub url_capa: Option<String>,
    pub tipo: TipoObra,
    pub status: StatusObra,
    pub nota_imdb: Option<f64>,
    pub total_episodios: Option<i32>,
    pub total_temporadas: Option<i32>,
    pub episodio_atual: Option<i32>,
    pub temporada_atual: Option<i32>,
    pub comentario: Option<String>,
    pub data_assistido: Option<String>,
    pub diretores: Vec<Diretor>,
    pub generos: Vec<Genero>,
    pub plataformas: Vec<Plataforma>,
    pub tags: Vec<Tag>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Avaliacao {
    pub id: i64,
    /// Id of the rated work.
    pub obra: i64,
    pub nota: f64,
    pub comentario: Option<String>,
    pub data_avaliacao: String,
    pub editado: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A user-curated list of works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lista {
    pub id: i64,
    pub nome: String,
    pub descricao: Option<String>,
    pub publica: bool,
    pub obras: Vec<Obra>,
    pub created_at: String,
    pub updated_at: String,
}
