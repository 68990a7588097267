//! Book instance operations for the PostgreSQL backend.

use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::{SqlResult, internal, record_id_from_bytes, row_error};
use crate::store::StoreError;
use crate::{BookInstance, BookInstanceRecord, LoanStatus, RecordId};

fn record_from_row(row: &PgRow) -> SqlResult<BookInstanceRecord> {
    let id_bytes: Vec<u8> = row.try_get("instance_id").map_err(row_error)?;
    let book_bytes: Vec<u8> = row.try_get("book_id").map_err(row_error)?;
    let status_text: String = row.try_get("status").map_err(row_error)?;
    let status = LoanStatus::from_str(&status_text)
        .map_err(|e| StoreError::Internal(e.to_string()))?;
    Ok(BookInstanceRecord {
        id: record_id_from_bytes(&id_bytes)?,
        instance: BookInstance {
            book: record_id_from_bytes(&book_bytes)?,
            imprint: row.try_get("imprint").map_err(row_error)?,
            status,
            due_back: row.try_get("due_back").map_err(row_error)?,
        },
    })
}

/// Inserts a copy row under the given identity.
pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    instance: &BookInstance,
) -> SqlResult<()> {
    sqlx::query(
        r#"
        INSERT INTO book_instances (instance_id, book_id, imprint, status, due_back)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .bind(instance.book.as_bytes().as_slice())
    .bind(&instance.imprint)
    .bind(instance.status.to_string())
    .bind(instance.due_back)
    .execute(&mut **tx)
    .await
    .map_err(|e| internal("creating book instance", e))?;
    Ok(())
}

/// Retrieves a copy by identity.
pub async fn get(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
) -> SqlResult<Option<BookInstanceRecord>> {
    let row = sqlx::query(
        r#"
        SELECT instance_id, book_id, imprint, status, due_back
        FROM book_instances
        WHERE instance_id = $1
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| internal("getting book instance", e))?;
    row.as_ref().map(record_from_row).transpose()
}

/// Lists all copies.
pub async fn list(tx: &mut Transaction<'_, Postgres>) -> SqlResult<Vec<BookInstanceRecord>> {
    let rows = sqlx::query(
        "SELECT instance_id, book_id, imprint, status, due_back FROM book_instances",
    )
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| internal("listing book instances", e))?;
    rows.iter().map(record_from_row).collect()
}

/// Lists the copies referencing a book.
pub async fn find_by_book(
    tx: &mut Transaction<'_, Postgres>,
    book: &RecordId,
) -> SqlResult<Vec<BookInstanceRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT instance_id, book_id, imprint, status, due_back
        FROM book_instances
        WHERE book_id = $1
        "#,
    )
    .bind(book.as_bytes().as_slice())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| internal("finding book instances by book", e))?;
    rows.iter().map(record_from_row).collect()
}

/// Replaces the stored fields of a copy.
pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    instance: &BookInstance,
) -> SqlResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE book_instances
        SET book_id = $2, imprint = $3, status = $4, due_back = $5
        WHERE instance_id = $1
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .bind(instance.book.as_bytes().as_slice())
    .bind(&instance.imprint)
    .bind(instance.status.to_string())
    .bind(instance.due_back)
    .execute(&mut **tx)
    .await
    .map_err(|e| internal("updating book instance", e))?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a copy.
pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: &RecordId) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM book_instances WHERE instance_id = $1")
        .bind(id.as_bytes().as_slice())
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("deleting book instance", e))?;
    Ok(result.rows_affected() > 0)
}

/// Counts all copies.
pub async fn count(tx: &mut Transaction<'_, Postgres>) -> SqlResult<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| internal("counting book instances", e))?;
    Ok(count as u64)
}

/// Counts the copies currently in a given status.
pub async fn count_with_status(
    tx: &mut Transaction<'_, Postgres>,
    status: LoanStatus,
) -> SqlResult<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
        .bind(status.to_string())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| internal("counting book instances by status", e))?;
    Ok(count as u64)
}
