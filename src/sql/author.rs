//! Author operations for the PostgreSQL backend.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::{SqlResult, internal, record_id_from_bytes, row_error};
use crate::{Author, AuthorRecord, RecordId};

fn record_from_row(row: &PgRow) -> SqlResult<AuthorRecord> {
    let id_bytes: Vec<u8> = row.try_get("author_id").map_err(row_error)?;
    Ok(AuthorRecord {
        id: record_id_from_bytes(&id_bytes)?,
        author: Author {
            first_name: row.try_get("first_name").map_err(row_error)?,
            family_name: row.try_get("family_name").map_err(row_error)?,
            date_of_birth: row.try_get("date_of_birth").map_err(row_error)?,
            date_of_death: row.try_get("date_of_death").map_err(row_error)?,
        },
    })
}

/// Inserts an author row under the given identity.
pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    author: &Author,
) -> SqlResult<()> {
    sqlx::query(
        r#"
        INSERT INTO authors (author_id, first_name, family_name, date_of_birth, date_of_death)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .bind(&author.first_name)
    .bind(&author.family_name)
    .bind(author.date_of_birth)
    .bind(author.date_of_death)
    .execute(&mut **tx)
    .await
    .map_err(|e| internal("creating author", e))?;
    Ok(())
}

/// Retrieves an author by identity.
pub async fn get(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
) -> SqlResult<Option<AuthorRecord>> {
    let row = sqlx::query(
        r#"
        SELECT author_id, first_name, family_name, date_of_birth, date_of_death
        FROM authors
        WHERE author_id = $1
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| internal("getting author", e))?;
    row.as_ref().map(record_from_row).transpose()
}

/// Lists all authors ordered by family name.
pub async fn list(tx: &mut Transaction<'_, Postgres>) -> SqlResult<Vec<AuthorRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT author_id, first_name, family_name, date_of_birth, date_of_death
        FROM authors
        ORDER BY family_name ASC
        "#,
    )
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| internal("listing authors", e))?;
    rows.iter().map(record_from_row).collect()
}

/// Replaces the stored fields of an author.
pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    author: &Author,
) -> SqlResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE authors
        SET first_name = $2, family_name = $3, date_of_birth = $4, date_of_death = $5
        WHERE author_id = $1
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .bind(&author.first_name)
    .bind(&author.family_name)
    .bind(author.date_of_birth)
    .bind(author.date_of_death)
    .execute(&mut **tx)
    .await
    .map_err(|e| internal("updating author", e))?;
    Ok(result.rows_affected() > 0)
}

/// Deletes an author.
pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: &RecordId) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM authors WHERE author_id = $1")
        .bind(id.as_bytes().as_slice())
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("deleting author", e))?;
    Ok(result.rows_affected() > 0)
}

/// Counts all authors.
pub async fn count(tx: &mut Transaction<'_, Postgres>) -> SqlResult<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| internal("counting authors", e))?;
    Ok(count as u64)
}
