//! Genre operations for the PostgreSQL backend.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::{SqlResult, internal, record_id_from_bytes, row_error};
use crate::{Genre, GenreRecord, RecordId};

fn record_from_row(row: &PgRow) -> SqlResult<GenreRecord> {
    let id_bytes: Vec<u8> = row.try_get("genre_id").map_err(row_error)?;
    Ok(GenreRecord {
        id: record_id_from_bytes(&id_bytes)?,
        genre: Genre {
            name: row.try_get("name").map_err(row_error)?,
        },
    })
}

/// Inserts a genre row under the given identity.
pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    genre: &Genre,
) -> SqlResult<()> {
    sqlx::query("INSERT INTO genres (genre_id, name) VALUES ($1, $2)")
        .bind(id.as_bytes().as_slice())
        .bind(&genre.name)
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("creating genre", e))?;
    Ok(())
}

/// Retrieves a genre by identity.
pub async fn get(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
) -> SqlResult<Option<GenreRecord>> {
    let row = sqlx::query("SELECT genre_id, name FROM genres WHERE genre_id = $1")
        .bind(id.as_bytes().as_slice())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| internal("getting genre", e))?;
    row.as_ref().map(record_from_row).transpose()
}

/// Finds a genre by its exact name.
pub async fn find_by_name(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> SqlResult<Option<GenreRecord>> {
    let row = sqlx::query("SELECT genre_id, name FROM genres WHERE name = $1 LIMIT 1")
        .bind(name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| internal("finding genre by name", e))?;
    row.as_ref().map(record_from_row).transpose()
}

/// Lists all genres ordered by name.
pub async fn list(tx: &mut Transaction<'_, Postgres>) -> SqlResult<Vec<GenreRecord>> {
    let rows = sqlx::query("SELECT genre_id, name FROM genres ORDER BY name ASC")
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| internal("listing genres", e))?;
    rows.iter().map(record_from_row).collect()
}

/// Replaces the stored fields of a genre.
pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    genre: &Genre,
) -> SqlResult<bool> {
    let result = sqlx::query("UPDATE genres SET name = $2 WHERE genre_id = $1")
        .bind(id.as_bytes().as_slice())
        .bind(&genre.name)
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("updating genre", e))?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a genre.
pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: &RecordId) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM genres WHERE genre_id = $1")
        .bind(id.as_bytes().as_slice())
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("deleting genre", e))?;
    Ok(result.rows_affected() > 0)
}

/// Counts all genres.
pub async fn count(tx: &mut Transaction<'_, Postgres>) -> SqlResult<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| internal("counting genres", e))?;
    Ok(count as u64)
}
