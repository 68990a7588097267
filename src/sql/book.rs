//! Book operations for the PostgreSQL backend.
//!
//! A book's genre set lives in the `book_genres` join table; the join rows
//! are replaced wholesale whenever a book is written.

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};

use super::{SqlResult, internal, record_id_from_bytes, row_error};
use crate::{Book, BookRecord, RecordId};

struct BookRow {
    id: RecordId,
    title: String,
    author: RecordId,
    summary: String,
    isbn: String,
}

fn parts_from_row(row: &PgRow) -> SqlResult<BookRow> {
    let id_bytes: Vec<u8> = row.try_get("book_id").map_err(row_error)?;
    let author_bytes: Vec<u8> = row.try_get("author_id").map_err(row_error)?;
    Ok(BookRow {
        id: record_id_from_bytes(&id_bytes)?,
        title: row.try_get("title").map_err(row_error)?,
        author: record_id_from_bytes(&author_bytes)?,
        summary: row.try_get("summary").map_err(row_error)?,
        isbn: row.try_get("isbn").map_err(row_error)?,
    })
}

async fn genres_for(
    tx: &mut Transaction<'_, Postgres>,
    book: &RecordId,
) -> SqlResult<Vec<RecordId>> {
    let rows = sqlx::query("SELECT genre_id FROM book_genres WHERE book_id = $1")
        .bind(book.as_bytes().as_slice())
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| internal("listing book genres", e))?;
    rows.iter()
        .map(|row| {
            let bytes: Vec<u8> = row.try_get("genre_id").map_err(row_error)?;
            record_id_from_bytes(&bytes)
        })
        .collect()
}

async fn record_from_parts(
    tx: &mut Transaction<'_, Postgres>,
    parts: BookRow,
) -> SqlResult<BookRecord> {
    let genre = genres_for(tx, &parts.id).await?;
    Ok(BookRecord {
        id: parts.id,
        book: Book {
            title: parts.title,
            author: parts.author,
            summary: parts.summary,
            isbn: parts.isbn,
            genre,
        },
    })
}

async fn replace_genres(
    tx: &mut Transaction<'_, Postgres>,
    book: &RecordId,
    genres: &[RecordId],
) -> SqlResult<()> {
    sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
        .bind(book.as_bytes().as_slice())
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("clearing book genres", e))?;
    for genre in genres {
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
            .bind(book.as_bytes().as_slice())
            .bind(genre.as_bytes().as_slice())
            .execute(&mut **tx)
            .await
            .map_err(|e| internal("attaching book genre", e))?;
    }
    Ok(())
}

/// Inserts a book row and its genre set under the given identity.
pub async fn create(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    book: &Book,
) -> SqlResult<()> {
    sqlx::query(
        r#"
        INSERT INTO books (book_id, title, author_id, summary, isbn)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .bind(&book.title)
    .bind(book.author.as_bytes().as_slice())
    .bind(&book.summary)
    .bind(&book.isbn)
    .execute(&mut **tx)
    .await
    .map_err(|e| internal("creating book", e))?;
    replace_genres(tx, id, &book.genre).await
}

/// Retrieves a book by identity.
pub async fn get(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
) -> SqlResult<Option<BookRecord>> {
    let row = sqlx::query(
        "SELECT book_id, title, author_id, summary, isbn FROM books WHERE book_id = $1",
    )
    .bind(id.as_bytes().as_slice())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| internal("getting book", e))?;
    let Some(row) = row else {
        return Ok(None);
    };
    let parts = parts_from_row(&row)?;
    Ok(Some(record_from_parts(tx, parts).await?))
}

async fn collect_records(
    tx: &mut Transaction<'_, Postgres>,
    rows: Vec<PgRow>,
) -> SqlResult<Vec<BookRecord>> {
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let parts = parts_from_row(row)?;
        records.push(record_from_parts(tx, parts).await?);
    }
    Ok(records)
}

/// Lists all books ordered by title.
pub async fn list(tx: &mut Transaction<'_, Postgres>) -> SqlResult<Vec<BookRecord>> {
    let rows = sqlx::query(
        "SELECT book_id, title, author_id, summary, isbn FROM books ORDER BY title ASC",
    )
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| internal("listing books", e))?;
    collect_records(tx, rows).await
}

/// Lists the books referencing an author, ordered by title.
pub async fn find_by_author(
    tx: &mut Transaction<'_, Postgres>,
    author: &RecordId,
) -> SqlResult<Vec<BookRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT book_id, title, author_id, summary, isbn
        FROM books
        WHERE author_id = $1
        ORDER BY title ASC
        "#,
    )
    .bind(author.as_bytes().as_slice())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| internal("finding books by author", e))?;
    collect_records(tx, rows).await
}

/// Lists the books whose genre set contains a genre, ordered by title.
pub async fn find_by_genre(
    tx: &mut Transaction<'_, Postgres>,
    genre: &RecordId,
) -> SqlResult<Vec<BookRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT b.book_id, b.title, b.author_id, b.summary, b.isbn
        FROM books b
        JOIN book_genres bg ON bg.book_id = b.book_id
        WHERE bg.genre_id = $1
        ORDER BY b.title ASC
        "#,
    )
    .bind(genre.as_bytes().as_slice())
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| internal("finding books by genre", e))?;
    collect_records(tx, rows).await
}

/// Replaces the stored fields and genre set of a book.
pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    id: &RecordId,
    book: &Book,
) -> SqlResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE books
        SET title = $2, author_id = $3, summary = $4, isbn = $5
        WHERE book_id = $1
        "#,
    )
    .bind(id.as_bytes().as_slice())
    .bind(&book.title)
    .bind(book.author.as_bytes().as_slice())
    .bind(&book.summary)
    .bind(&book.isbn)
    .execute(&mut **tx)
    .await
    .map_err(|e| internal("updating book", e))?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }
    replace_genres(tx, id, &book.genre).await?;
    Ok(true)
}

/// Deletes a book; its join rows cascade.
pub async fn delete(tx: &mut Transaction<'_, Postgres>, id: &RecordId) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
        .bind(id.as_bytes().as_slice())
        .execute(&mut **tx)
        .await
        .map_err(|e| internal("deleting book", e))?;
    Ok(result.rows_affected() > 0)
}

/// Counts all books.
pub async fn count(tx: &mut Transaction<'_, Postgres>) -> SqlResult<u64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| internal("counting books", e))?;
    Ok(count as u64)
}
