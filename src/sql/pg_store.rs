use axum::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use super::{author, book, book_instance, genre, internal};
use crate::store::{CatalogStore, StoreError};
use crate::{
    Author, AuthorRecord, Book, BookInstance, BookInstanceRecord, BookRecord, Genre, GenreRecord,
    LoanStatus, RecordId,
};

/// PostgreSQL-backed implementation of [`CatalogStore`].
///
/// Every trait operation runs in its own transaction. Identities are minted
/// in-process, the same way the in-memory store mints them.
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Wraps an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Applies any pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| internal("beginning transaction", e))
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), StoreError> {
    tx.commit()
        .await
        .map_err(|e| internal("committing transaction", e))
}

fn mint_id() -> Result<RecordId, StoreError> {
    RecordId::random().map_err(|e| StoreError::Internal(e.to_string()))
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn insert_author(&self, record: &Author) -> Result<RecordId, StoreError> {
        let id = mint_id()?;
        let mut tx = self.begin().await?;
        author::create(&mut tx, &id, record).await?;
        commit(tx).await?;
        Ok(id)
    }

    async fn get_author(&self, id: &RecordId) -> Result<Option<AuthorRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let record = author::get(&mut tx, id).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = author::list(&mut tx).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn update_author(&self, id: &RecordId, record: &Author) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let updated = author::update(&mut tx, id, record).await?;
        commit(tx).await?;
        Ok(updated)
    }

    async fn delete_author(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let deleted = author::delete(&mut tx, id).await?;
        commit(tx).await?;
        Ok(deleted)
    }

    async fn count_authors(&self) -> Result<u64, StoreError> {
        let mut tx = self.begin().await?;
        let count = author::count(&mut tx).await?;
        commit(tx).await?;
        Ok(count)
    }

    async fn insert_genre(&self, record: &Genre) -> Result<RecordId, StoreError> {
        let id = mint_id()?;
        let mut tx = self.begin().await?;
        genre::create(&mut tx, &id, record).await?;
        commit(tx).await?;
        Ok(id)
    }

    async fn get_genre(&self, id: &RecordId) -> Result<Option<GenreRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let record = genre::get(&mut tx, id).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn find_genre_by_name(&self, name: &str) -> Result<Option<GenreRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let record = genre::find_by_name(&mut tx, name).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn list_genres(&self) -> Result<Vec<GenreRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = genre::list(&mut tx).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn update_genre(&self, id: &RecordId, record: &Genre) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let updated = genre::update(&mut tx, id, record).await?;
        commit(tx).await?;
        Ok(updated)
    }

    async fn delete_genre(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let deleted = genre::delete(&mut tx, id).await?;
        commit(tx).await?;
        Ok(deleted)
    }

    async fn count_genres(&self) -> Result<u64, StoreError> {
        let mut tx = self.begin().await?;
        let count = genre::count(&mut tx).await?;
        commit(tx).await?;
        Ok(count)
    }

    async fn insert_book(&self, record: &Book) -> Result<RecordId, StoreError> {
        let id = mint_id()?;
        let mut tx = self.begin().await?;
        book::create(&mut tx, &id, record).await?;
        commit(tx).await?;
        Ok(id)
    }

    async fn get_book(&self, id: &RecordId) -> Result<Option<BookRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let record = book::get(&mut tx, id).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn list_books(&self) -> Result<Vec<BookRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = book::list(&mut tx).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn find_books_by_author(&self, id: &RecordId) -> Result<Vec<BookRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = book::find_by_author(&mut tx, id).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn find_books_by_genre(&self, id: &RecordId) -> Result<Vec<BookRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = book::find_by_genre(&mut tx, id).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn update_book(&self, id: &RecordId, record: &Book) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let updated = book::update(&mut tx, id, record).await?;
        commit(tx).await?;
        Ok(updated)
    }

    async fn delete_book(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let deleted = book::delete(&mut tx, id).await?;
        commit(tx).await?;
        Ok(deleted)
    }

    async fn count_books(&self) -> Result<u64, StoreError> {
        let mut tx = self.begin().await?;
        let count = book::count(&mut tx).await?;
        commit(tx).await?;
        Ok(count)
    }

    async fn insert_book_instance(
        &self,
        record: &BookInstance,
    ) -> Result<RecordId, StoreError> {
        let id = mint_id()?;
        let mut tx = self.begin().await?;
        book_instance::create(&mut tx, &id, record).await?;
        commit(tx).await?;
        Ok(id)
    }

    async fn get_book_instance(
        &self,
        id: &RecordId,
    ) -> Result<Option<BookInstanceRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let record = book_instance::get(&mut tx, id).await?;
        commit(tx).await?;
        Ok(record)
    }

    async fn list_book_instances(&self) -> Result<Vec<BookInstanceRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = book_instance::list(&mut tx).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn find_book_instances_by_book(
        &self,
        id: &RecordId,
    ) -> Result<Vec<BookInstanceRecord>, StoreError> {
        let mut tx = self.begin().await?;
        let records = book_instance::find_by_book(&mut tx, id).await?;
        commit(tx).await?;
        Ok(records)
    }

    async fn update_book_instance(
        &self,
        id: &RecordId,
        record: &BookInstance,
    ) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let updated = book_instance::update(&mut tx, id, record).await?;
        commit(tx).await?;
        Ok(updated)
    }

    async fn delete_book_instance(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;
        let deleted = book_instance::delete(&mut tx, id).await?;
        commit(tx).await?;
        Ok(deleted)
    }

    async fn count_book_instances(&self) -> Result<u64, StoreError> {
        let mut tx = self.begin().await?;
        let count = book_instance::count(&mut tx).await?;
        commit(tx).await?;
        Ok(count)
    }

    async fn count_book_instances_with_status(
        &self,
        status: LoanStatus,
    ) -> Result<u64, StoreError> {
        let mut tx = self.begin().await?;
        let count = book_instance::count_with_status(&mut tx, status).await?;
        commit(tx).await?;
        Ok(count)
    }
}
