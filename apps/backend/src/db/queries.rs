//! Shared SQL used by several API modules and the TMDB importer.
//!
//! All functions take a plain `&Connection`; callers that need atomicity pass
//! a `Transaction`, which derefs to `Connection`.

use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use super::models::{
    Avaliacao, Diretor, Genero, Lista, Obra, Plataforma, StatusObra, Tag, TipoObra,
};

pub const DIRETOR_COLUMNS: &str = "id, nome, biografia, url_foto";
pub const GENERO_COLUMNS: &str = "id, nome, created_at";
pub const PLATAFORMA_COLUMNS: &str = "id, nome, logo, cor, url, ativa, created_at";
pub const TAG_COLUMNS: &str = "id, nome, cor, created_at";
pub const AVALIACAO_COLUMNS: &str =
    "id, obra_id, nota, comentario, data_avaliacao, editado, created_at, updated_at";
const OBRA_COLUMNS: &str = "id, titulo, sinopse, ano_lancamento, duracao_minutos, url_capa, \
     tipo, status, nota_imdb, total_episodios, total_temporadas, episodio_atual, \
     temporada_atual, comentario, data_assistido, created_at, updated_at";
const LISTA_COLUMNS: &str = "id, nome, descricao, publica, created_at, updated_at";

// =============================================================================
// Row mappers
// =============================================================================

pub fn map_diretor_row(row: &Row) -> rusqlite::Result<Diretor> {
    Ok(Diretor {
        id: row.get(0)?,
        nome: row.get(1)?,
        biografia: row.get(2)?,
        url_foto: row.get(3)?,
    })
}

pub fn map_genero_row(row: &Row) -> rusqlite::Result<Genero> {
    Ok(Genero {
        id: row.get(0)?,
        nome: row.get(1)?,
        created_at: row.get(2)?,
    })
}

pub fn map_plataforma_row(row: &Row) -> rusqlite::Result<Plataforma> {
    Ok(Plataforma {
        id: row.get(0)?,
        nome: row.get(1)?,
        logo: row.get(2)?,
        cor: row.get(3)?,
        url: row.get(4)?,
        ativa: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn map_tag_row(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        nome: row.get(1)?,
        cor: row.get(2)?,
        created_at: row.get(3)?,
    })
}

pub fn map_avaliacao_row(row: &Row) -> rusqlite::Result<Avaliacao> {
    Ok(Avaliacao {
        id: row.get(0)?,
        obra: row.get(1)?,
        nota: row.get(2)?,
        comentario: row.get(3)?,
        data_avaliacao: row.get(4)?,
        editado: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Parses a TEXT column into one of the catalog enums.
fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Maps the scalar columns of an `obras` row; relations are left empty.
fn map_obra_row(row: &Row) -> rusqlite::Result<Obra> {
    Ok(Obra {
        id: row.get(0)?,
        titulo: row.get(1)?,
        sinopse: row.get(2)?,
        ano_lancamento: row.get(3)?,
        duracao_minutos: row.get(4)?,
        url_capa: row.get(5)?,
        tipo: parse_column::<TipoObra>(row, 6)?,
        status: parse_column::<StatusObra>(row, 7)?,
        nota_imdb: row.get(8)?,
        total_episodios: row.get(9)?,
        total_temporadas: row.get(10)?,
        episodio_atual: row.get(11)?,
        temporada_atual: row.get(12)?,
        comentario: row.get(13)?,
        data_assistido: row.get(14)?,
        diretores: Vec::new(),
        generos: Vec::new(),
        plataformas: Vec::new(),
        tags: Vec::new(),
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

// =============================================================================
// Works
// =============================================================================

/// Many-to-many relations of a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relacao {
    Diretores,
    Generos,
    Plataformas,
    Tags,
}

impl Relacao {
    /// Entity table referenced by the relation.
    pub fn table(self) -> &'static str {
        match self {
            Relacao::Diretores => "diretores",
            Relacao::Generos => "generos",
            Relacao::Plataformas => "plataformas",
            Relacao::Tags => "tags",
        }
    }

    fn join_table(self) -> &'static str {
        match self {
            Relacao::Diretores => "obras_diretores",
            Relacao::Generos => "obras_generos",
            Relacao::Plataformas => "obras_plataformas",
            Relacao::Tags => "obras_tags",
        }
    }

    fn fk_column(self) -> &'static str {
        match self {
            Relacao::Diretores => "diretor_id",
            Relacao::Generos => "genero_id",
            Relacao::Plataformas => "plataforma_id",
            Relacao::Tags => "tag_id",
        }
    }
}

/// Filters accepted by the work listing.
#[derive(Debug, Clone, Default)]
pub struct ObraFilter {
    pub status: Option<StatusObra>,
    pub tipo: Option<TipoObra>,
    pub search: Option<String>,
}

/// Loads a single work with its relations.
///
/// Returns `QueryReturnedNoRows` when the id does not exist.
pub fn get_obra(conn: &Connection, obra_id: i64) -> rusqlite::Result<Obra> {
    let mut obra = conn.query_row(
        &format!("SELECT {} FROM obras WHERE id = ?1", OBRA_COLUMNS),
        [obra_id],
        map_obra_row,
    )?;
    load_relations(conn, &mut obra)?;
    Ok(obra)
}

/// Lists works, newest first.
pub fn list_obras(conn: &Connection, filter: &ObraFilter) -> rusqlite::Result<Vec<Obra>> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut stmt = conn.prepare(&format!(
        r#"
        SELECT {} FROM obras
        WHERE (?1 IS NULL OR status = ?1)
          AND (?2 IS NULL OR tipo = ?2)
          AND (?3 IS NULL OR instr(unicode_lower(titulo), ?3) > 0)
        ORDER BY created_at DESC, id DESC
        "#,
        OBRA_COLUMNS
    ))?;

    let mut obras = stmt
        .query_map(
            params![
                filter.status.map(|s| s.to_string()),
                filter.tipo.map(|t| t.to_string()),
                search,
            ],
            map_obra_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for obra in obras.iter_mut() {
        load_relations(conn, obra)?;
    }

    Ok(obras)
}

fn load_relations(conn: &Connection, obra: &mut Obra) -> rusqlite::Result<()> {
    obra.diretores = load_related(
        conn,
        Relacao::Diretores,
        obra.id,
        DIRETOR_COLUMNS,
        map_diretor_row,
    )?;
    obra.generos = load_related(
        conn,
        Relacao::Generos,
        obra.id,
        GENERO_COLUMNS,
        map_genero_row,
    )?;
    obra.plataformas = load_related(
        conn,
        Relacao::Plataformas,
        obra.id,
        PLATAFORMA_COLUMNS,
        map_plataforma_row,
    )?;
    obra.tags = load_related(conn, Relacao::Tags, obra.id, TAG_COLUMNS, map_tag_row)?;
    Ok(())
}

fn load_related<T>(
    conn: &Connection,
    relacao: Relacao,
    obra_id: i64,
    columns: &str,
    mapper: fn(&Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let columns = columns
        .split(", ")
        .map(|c| format!("t.{}", c))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {columns} FROM {table} t \
         JOIN {join} j ON j.{fk} = t.id \
         WHERE j.obra_id = ?1 ORDER BY t.nome",
        columns = columns,
        table = relacao.table(),
        join = relacao.join_table(),
        fk = relacao.fk_column(),
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([obra_id], mapper)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Replaces the whole set of related ids for a work.
pub fn set_relations(
    conn: &Connection,
    relacao: Relacao,
    obra_id: i64,
    ids: &[i64],
) -> rusqlite::Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE obra_id = ?1", relacao.join_table()),
        [obra_id],
    )?;
    for id in ids {
        link(conn, relacao, obra_id, *id)?;
    }
    Ok(())
}

/// Links one entity to a work; linking twice is a no-op.
pub fn link(
    conn: &Connection,
    relacao: Relacao,
    obra_id: i64,
    target_id: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (obra_id, {}) VALUES (?1, ?2)",
            relacao.join_table(),
            relacao.fk_column()
        ),
        params![obra_id, target_id],
    )?;
    Ok(())
}

/// Returns the ids from `ids` that do not exist in `table`.
pub fn missing_ids(conn: &Connection, table: &str, ids: &[i64]) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table))?;
    let mut missing = Vec::new();
    for id in ids {
        let exists: bool = stmt.query_row([id], |row| row.get(0))?;
        if !exists && !missing.contains(id) {
            missing.push(*id);
        }
    }
    Ok(missing)
}

pub fn exists(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
        [id],
        |row| row.get(0),
    )
}

/// Whether another row of `table` already uses `nome`.
pub fn name_taken(
    conn: &Connection,
    table: &str,
    nome: &str,
    exclude_id: Option<i64>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE nome = ?1 AND (?2 IS NULL OR id <> ?2))",
            table
        ),
        params![nome, exclude_id],
        |row| row.get(0),
    )
}

// =============================================================================
// Get-or-create by unique name
// =============================================================================

/// Returns the id of the genre named `nome`, creating it when absent.
pub fn get_or_create_genero(conn: &Connection, nome: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO generos (nome) VALUES (?1) ON CONFLICT(nome) DO NOTHING",
        [nome],
    )?;
    conn.query_row("SELECT id FROM generos WHERE nome = ?1", [nome], |row| {
        row.get(0)
    })
}

/// Returns the id of the director named `nome`, creating it with `biografia`
/// when absent. An existing director keeps its biography.
pub fn get_or_create_diretor(
    conn: &Connection,
    nome: &str,
    biografia: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO diretores (nome, biografia) VALUES (?1, ?2) ON CONFLICT(nome) DO NOTHING",
        params![nome, biografia],
    )?;
    conn.query_row("SELECT id FROM diretores WHERE nome = ?1", [nome], |row| {
        row.get(0)
    })
}

// =============================================================================
// Lists
// =============================================================================

/// Loads a list with its works, in the order they were added.
pub fn get_lista(conn: &Connection, lista_id: i64) -> rusqlite::Result<Lista> {
    let mut lista = conn.query_row(
        &format!("SELECT {} FROM listas WHERE id = ?1", LISTA_COLUMNS),
        [lista_id],
        map_lista_row,
    )?;
    lista.obras = load_lista_obras(conn, lista.id)?;
    Ok(lista)
}

pub fn list_listas(conn: &Connection) -> rusqlite::Result<Vec<Lista>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM listas ORDER BY created_at DESC, id DESC",
        LISTA_COLUMNS
    ))?;
    let mut listas = stmt
        .query_map([], map_lista_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for lista in listas.iter_mut() {
        lista.obras = load_lista_obras(conn, lista.id)?;
    }
    Ok(listas)
}

fn load_lista_obras(conn: &Connection, lista_id: i64) -> rusqlite::Result<Vec<Obra>> {
    let mut stmt = conn.prepare(
        "SELECT obra_id FROM listas_obras WHERE lista_id = ?1 ORDER BY added_at, rowid",
    )?;
    let ids = stmt
        .query_map([lista_id], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    ids.into_iter().map(|id| get_obra(conn, id)).collect()
}

fn map_lista_row(row: &Row) -> rusqlite::Result<Lista> {
    Ok(Lista {
        id: row.get(0)?,
        nome: row.get(1)?,
        descricao: row.get(2)?,
        publica: row.get(3)?,
        obras: Vec::new(),
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Fetches a single row by id, mapping "no rows" to `None`.
pub fn find_by_id<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    id: i64,
    mapper: fn(&Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<Option<T>> {
    conn.query_row(
        &format!("SELECT {} FROM {} WHERE id = ?1", columns, table),
        [id],
        mapper,
    )
    .optional()
}
