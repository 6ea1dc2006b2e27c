use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use time::OffsetDateTime;

use crate::demandas::catalog::Status;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Demanda {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub categoria: String,
    pub cliente: String,
    pub descricao: String,
    pub tempo: i64,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub data: OffsetDateTime,
}

/// Equality filters for listings. `None` means "no filter"; role scoping is
/// resolved by the caller before this reaches the query.
#[derive(Debug, Default)]
pub struct DemandaFilter {
    pub user_id: Option<i64>,
    pub categoria: Option<String>,
    pub status: Option<String>,
}

/// Fields a PATCH may change. Validation happens before construction.
#[derive(Debug, Default)]
pub struct DemandaPatch {
    pub categoria: Option<String>,
    pub cliente: Option<String>,
    pub descricao: Option<String>,
    pub tempo: Option<i64>,
    pub status: Option<Status>,
}

impl DemandaPatch {
    pub fn is_empty(&self) -> bool {
        self.categoria.is_none()
            && self.cliente.is_none()
            && self.descricao.is_none()
            && self.tempo.is_none()
            && self.status.is_none()
    }
}

pub async fn create(
    db: &SqlitePool,
    user_id: i64,
    categoria: &str,
    cliente: &str,
    descricao: &str,
    tempo: i64,
    status: Status,
) -> Result<Demanda, ApiError> {
    let demanda = sqlx::query_as::<_, Demanda>(
        "INSERT INTO demandas (user_id, categoria, cliente, descricao, tempo, status, data)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING id, user_id, categoria, cliente, descricao, tempo, status, data",
    )
    .bind(user_id)
    .bind(categoria)
    .bind(cliente)
    .bind(descricao)
    .bind(tempo)
    .bind(status)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(db)
    .await?;
    Ok(demanda)
}

pub async fn list(db: &SqlitePool, filter: &DemandaFilter) -> Result<Vec<Demanda>, ApiError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, user_id, categoria, cliente, descricao, tempo, status, data
         FROM demandas WHERE 1=1",
    );
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(categoria) = &filter.categoria {
        qb.push(" AND categoria = ").push_bind(categoria);
    }
    if let Some(status) = &filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    qb.push(" ORDER BY data DESC");

    let demandas = qb.build_query_as::<Demanda>().fetch_all(db).await?;
    Ok(demandas)
}

/// Fetches a demanda only when owned by the requester; everything else is
/// indistinguishable from absence.
pub async fn get_owned(
    db: &SqlitePool,
    id: i64,
    requester_id: i64,
) -> Result<Option<Demanda>, ApiError> {
    let demanda = sqlx::query_as::<_, Demanda>(
        "SELECT id, user_id, categoria, cliente, descricao, tempo, status, data
         FROM demandas WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(requester_id)
    .fetch_optional(db)
    .await?;
    Ok(demanda)
}

pub async fn update(
    db: &SqlitePool,
    id: i64,
    requester_id: i64,
    patch: &DemandaPatch,
) -> Result<Demanda, ApiError> {
    if get_owned(db, id, requester_id).await?.is_none() {
        return Err(ApiError::Forbidden);
    }
    if patch.is_empty() {
        return Err(ApiError::validation(
            "no_fields_to_update",
            "Nenhum campo para atualizar",
        ));
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE demandas SET ");
    {
        let mut sets = qb.separated(", ");
        if let Some(categoria) = &patch.categoria {
            sets.push("categoria = ").push_bind_unseparated(categoria);
        }
        if let Some(cliente) = &patch.cliente {
            sets.push("cliente = ").push_bind_unseparated(cliente);
        }
        if let Some(descricao) = &patch.descricao {
            sets.push("descricao = ").push_bind_unseparated(descricao);
        }
        if let Some(tempo) = patch.tempo {
            sets.push("tempo = ").push_bind_unseparated(tempo);
        }
        if let Some(status) = patch.status {
            sets.push("status = ").push_bind_unseparated(status);
        }
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.build().execute(db).await?;

    get_owned(db, id, requester_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Demanda não encontrada".into()))
}

pub async fn delete(db: &SqlitePool, id: i64, requester_id: i64) -> Result<(), ApiError> {
    if get_owned(db, id, requester_id).await?.is_none() {
        return Err(ApiError::Forbidden);
    }
    sqlx::query("DELETE FROM demandas WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
