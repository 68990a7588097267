//! # Catalog Storage Abstraction
//!
//! This module defines the storage interface for the catalog and its default
//! in-memory implementation. The store owns every record; handlers and the
//! integrity guard reach it only through the [`CatalogStore`] trait, which
//! keeps the orchestration layer testable against [`MemoryCatalogStore`]
//! while the `sql` module provides the PostgreSQL backend behind the same
//! contract.
//!
//! ## Storage model
//!
//! ```text
//! Author ◄── Book ──► Genre          (many-to-one / many-to-many)
//!             ▲
//!             └── BookInstance       (many-to-one)
//! ```
//!
//! Identities are minted by the store at insert time and never change.
//! Reference columns are plain [`RecordId`] values resolved at read time; a
//! dangling reference is not an error at this layer.

use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use axum::http::StatusCode;

use crate::{
    Author, AuthorRecord, Book, BookInstance, BookInstanceRecord, BookRecord, Genre, GenreRecord,
    LoanStatus, RecordId,
};

/////////////////////////////////////////////// Errors ////////////////////////////////////////////////

/// Errors surfaced by store operations.
///
/// Store failures are terminal for the request that hit them; nothing in the
/// catalog retries a failed store call.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The addressed record does not exist.
    NotFound,
    /// The backend failed (connectivity, query, or entropy-source error).
    Internal(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Record not found in catalog store"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Maps a store failure to the terminal 500 response.
pub(crate) fn store_failure(err: StoreError) -> (StatusCode, &'static str) {
    eprintln!("store error: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "catalog store operation failed")
}

/////////////////////////////////////////////// Trait /////////////////////////////////////////////////

/// Shared handle to the store backing a router.
pub type SharedStore = std::sync::Arc<dyn CatalogStore>;

/// The storage interface for the four catalog collections.
///
/// All operations are thread-safe. `insert_*` mints and returns the new
/// record's identity. `update_*` replaces every stored field of an existing
/// record, preserving its identity, and reports whether the record existed;
/// `delete_*` likewise reports existence rather than failing on absence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Author operations

    /// Inserts an author and returns its new identity.
    async fn insert_author(&self, author: &Author) -> Result<RecordId, StoreError>;

    /// Retrieves an author by identity.
    async fn get_author(&self, id: &RecordId) -> Result<Option<AuthorRecord>, StoreError>;

    /// Lists all authors ordered by family name.
    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError>;

    /// Replaces the stored fields of an author.
    async fn update_author(&self, id: &RecordId, author: &Author) -> Result<bool, StoreError>;

    /// Deletes an author.
    async fn delete_author(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Counts all authors.
    async fn count_authors(&self) -> Result<u64, StoreError>;

    // Genre operations

    /// Inserts a genre and returns its new identity.
    async fn insert_genre(&self, genre: &Genre) -> Result<RecordId, StoreError>;

    /// Retrieves a genre by identity.
    async fn get_genre(&self, id: &RecordId) -> Result<Option<GenreRecord>, StoreError>;

    /// Finds a genre by its exact (sanitized) name.
    async fn find_genre_by_name(&self, name: &str) -> Result<Option<GenreRecord>, StoreError>;

    /// Lists all genres ordered by name.
    async fn list_genres(&self) -> Result<Vec<GenreRecord>, StoreError>;

    /// Replaces the stored fields of a genre.
    async fn update_genre(&self, id: &RecordId, genre: &Genre) -> Result<bool, StoreError>;

    /// Deletes a genre.
    async fn delete_genre(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Counts all genres.
    async fn count_genres(&self) -> Result<u64, StoreError>;

    // Book operations

    /// Inserts a book and returns its new identity.
    async fn insert_book(&self, book: &Book) -> Result<RecordId, StoreError>;

    /// Retrieves a book by identity.
    async fn get_book(&self, id: &RecordId) -> Result<Option<BookRecord>, StoreError>;

    /// Lists all books ordered by title.
    async fn list_books(&self) -> Result<Vec<BookRecord>, StoreError>;

    /// Lists the books referencing an author, ordered by title.
    async fn find_books_by_author(&self, author: &RecordId) -> Result<Vec<BookRecord>, StoreError>;

    /// Lists the books whose genre set contains a genre, ordered by title.
    async fn find_books_by_genre(&self, genre: &RecordId) -> Result<Vec<BookRecord>, StoreError>;

    /// Replaces the stored fields of a book.
    async fn update_book(&self, id: &RecordId, book: &Book) -> Result<bool, StoreError>;

    /// Deletes a book.
    async fn delete_book(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Counts all books.
    async fn count_books(&self) -> Result<u64, StoreError>;

    // BookInstance operations

    /// Inserts a book instance and returns its new identity.
    async fn insert_book_instance(
        &self,
        instance: &BookInstance,
    ) -> Result<RecordId, StoreError>;

    /// Retrieves a book instance by identity.
    async fn get_book_instance(
        &self,
        id: &RecordId,
    ) -> Result<Option<BookInstanceRecord>, StoreError>;

    /// Lists all book instances.
    async fn list_book_instances(&self) -> Result<Vec<BookInstanceRecord>, StoreError>;

    /// Lists the instances referencing a book.
    async fn find_book_instances_by_book(
        &self,
        book: &RecordId,
    ) -> Result<Vec<BookInstanceRecord>, StoreError>;

    /// Replaces the stored fields of a book instance.
    async fn update_book_instance(
        &self,
        id: &RecordId,
        instance: &BookInstance,
    ) -> Result<bool, StoreError>;

    /// Deletes a book instance.
    async fn delete_book_instance(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Counts all book instances.
    async fn count_book_instances(&self) -> Result<u64, StoreError>;

    /// Counts the book instances currently in a given status.
    async fn count_book_instances_with_status(
        &self,
        status: LoanStatus,
    ) -> Result<u64, StoreError>;
}

//////////////////////////////////////////// Memory Store /////////////////////////////////////////////

/// Thread-safe in-memory implementation of [`CatalogStore`].
///
/// Each collection is a `Mutex<HashMap>` keyed by [`RecordId`]. This is the
/// default backend for `stacksd` and the backend every integration test runs
/// against. Nothing survives a restart.
pub struct MemoryCatalogStore {
    authors: Mutex<HashMap<RecordId, Author>>,
    genres: Mutex<HashMap<RecordId, Genre>>,
    books: Mutex<HashMap<RecordId, Book>>,
    instances: Mutex<HashMap<RecordId, BookInstance>>,
}

impl MemoryCatalogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            authors: Mutex::new(HashMap::new()),
            genres: Mutex::new(HashMap::new()),
            books: Mutex::new(HashMap::new()),
            instances: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

fn mint_id<T>(collection: &HashMap<RecordId, T>) -> Result<RecordId, StoreError> {
    loop {
        let id = RecordId::random().map_err(|e| StoreError::Internal(e.to_string()))?;
        if !collection.contains_key(&id) {
            return Ok(id);
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_author(&self, author: &Author) -> Result<RecordId, StoreError> {
        let mut authors = self.authors.lock().unwrap();
        let id = mint_id(&authors)?;
        authors.insert(id, author.clone());
        Ok(id)
    }

    async fn get_author(&self, id: &RecordId) -> Result<Option<AuthorRecord>, StoreError> {
        let authors = self.authors.lock().unwrap();
        Ok(authors.get(id).map(|author| AuthorRecord {
            id: *id,
            author: author.clone(),
        }))
    }

    async fn list_authors(&self) -> Result<Vec<AuthorRecord>, StoreError> {
        let authors = self.authors.lock().unwrap();
        let mut records: Vec<AuthorRecord> = authors
            .iter()
            .map(|(id, author)| AuthorRecord {
                id: *id,
                author: author.clone(),
            })
            .collect();
        records.sort_by(|a, b| a.author.family_name.cmp(&b.author.family_name));
        Ok(records)
    }

    async fn update_author(&self, id: &RecordId, author: &Author) -> Result<bool, StoreError> {
        let mut authors = self.authors.lock().unwrap();
        if authors.contains_key(id) {
            authors.insert(*id, author.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_author(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut authors = self.authors.lock().unwrap();
        Ok(authors.remove(id).is_some())
    }

    async fn count_authors(&self) -> Result<u64, StoreError> {
        Ok(self.authors.lock().unwrap().len() as u64)
    }

    async fn insert_genre(&self, genre: &Genre) -> Result<RecordId, StoreError> {
        let mut genres = self.genres.lock().unwrap();
        let id = mint_id(&genres)?;
        genres.insert(id, genre.clone());
        Ok(id)
    }

    async fn get_genre(&self, id: &RecordId) -> Result<Option<GenreRecord>, StoreError> {
        let genres = self.genres.lock().unwrap();
        Ok(genres.get(id).map(|genre| GenreRecord {
            id: *id,
            genre: genre.clone(),
        }))
    }

    async fn find_genre_by_name(&self, name: &str) -> Result<Option<GenreRecord>, StoreError> {
        let genres = self.genres.lock().unwrap();
        Ok(genres
            .iter()
            .find(|(_, genre)| genre.name == name)
            .map(|(id, genre)| GenreRecord {
                id: *id,
                genre: genre.clone(),
            }))
    }

    async fn list_genres(&self) -> Result<Vec<GenreRecord>, StoreError> {
        let genres = self.genres.lock().unwrap();
        let mut records: Vec<GenreRecord> = genres
            .iter()
            .map(|(id, genre)| GenreRecord {
                id: *id,
                genre: genre.clone(),
            })
            .collect();
        records.sort_by(|a, b| a.genre.name.cmp(&b.genre.name));
        Ok(records)
    }

    async fn update_genre(&self, id: &RecordId, genre: &Genre) -> Result<bool, StoreError> {
        let mut genres = self.genres.lock().unwrap();
        if genres.contains_key(id) {
            genres.insert(*id, genre.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_genre(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut genres = self.genres.lock().unwrap();
        Ok(genres.remove(id).is_some())
    }

    async fn count_genres(&self) -> Result<u64, StoreError> {
        Ok(self.genres.lock().unwrap().len() as u64)
    }

    async fn insert_book(&self, book: &Book) -> Result<RecordId, StoreError> {
        let mut books = self.books.lock().unwrap();
        let id = mint_id(&books)?;
        books.insert(id, book.clone());
        Ok(id)
    }

    async fn get_book(&self, id: &RecordId) -> Result<Option<BookRecord>, StoreError> {
        let books = self.books.lock().unwrap();
        Ok(books.get(id).map(|book| BookRecord {
            id: *id,
            book: book.clone(),
        }))
    }

    async fn list_books(&self) -> Result<Vec<BookRecord>, StoreError> {
        let books = self.books.lock().unwrap();
        Ok(sorted_books(books.iter().map(|(id, book)| (*id, book.clone()))))
    }

    async fn find_books_by_author(&self, author: &RecordId) -> Result<Vec<BookRecord>, StoreError> {
        let books = self.books.lock().unwrap();
        Ok(sorted_books(
            books
                .iter()
                .filter(|(_, book)| book.author == *author)
                .map(|(id, book)| (*id, book.clone())),
        ))
    }

    async fn find_books_by_genre(&self, genre: &RecordId) -> Result<Vec<BookRecord>, StoreError> {
        let books = self.books.lock().unwrap();
        Ok(sorted_books(
            books
                .iter()
                .filter(|(_, book)| book.genre.contains(genre))
                .map(|(id, book)| (*id, book.clone())),
        ))
    }

    async fn update_book(&self, id: &RecordId, book: &Book) -> Result<bool, StoreError> {
        let mut books = self.books.lock().unwrap();
        if books.contains_key(id) {
            books.insert(*id, book.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_book(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut books = self.books.lock().unwrap();
        Ok(books.remove(id).is_some())
    }

    async fn count_books(&self) -> Result<u64, StoreError> {
        Ok(self.books.lock().unwrap().len() as u64)
    }

    async fn insert_book_instance(
        &self,
        instance: &BookInstance,
    ) -> Result<RecordId, StoreError> {
        let mut instances = self.instances.lock().unwrap();
        let id = mint_id(&instances)?;
        instances.insert(id, instance.clone());
        Ok(id)
    }

    async fn get_book_instance(
        &self,
        id: &RecordId,
    ) -> Result<Option<BookInstanceRecord>, StoreError> {
        let instances = self.instances.lock().unwrap();
        Ok(instances.get(id).map(|instance| BookInstanceRecord {
            id: *id,
            instance: instance.clone(),
        }))
    }

    async fn list_book_instances(&self) -> Result<Vec<BookInstanceRecord>, StoreError> {
        let instances = self.instances.lock().unwrap();
        Ok(instances
            .iter()
            .map(|(id, instance)| BookInstanceRecord {
                id: *id,
                instance: instance.clone(),
            })
            .collect())
    }

    async fn find_book_instances_by_book(
        &self,
        book: &RecordId,
    ) -> Result<Vec<BookInstanceRecord>, StoreError> {
        let instances = self.instances.lock().unwrap();
        Ok(instances
            .iter()
            .filter(|(_, instance)| instance.book == *book)
            .map(|(id, instance)| BookInstanceRecord {
                id: *id,
                instance: instance.clone(),
            })
            .collect())
    }

    async fn update_book_instance(
        &self,
        id: &RecordId,
        instance: &BookInstance,
    ) -> Result<bool, StoreError> {
        let mut instances = self.instances.lock().unwrap();
        if instances.contains_key(id) {
            instances.insert(*id, instance.clone());
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_book_instance(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut instances = self.instances.lock().unwrap();
        Ok(instances.remove(id).is_some())
    }

    async fn count_book_instances(&self) -> Result<u64, StoreError> {
        Ok(self.instances.lock().unwrap().len() as u64)
    }

    async fn count_book_instances_with_status(
        &self,
        status: LoanStatus,
    ) -> Result<u64, StoreError> {
        let instances = self.instances.lock().unwrap();
        Ok(instances
            .values()
            .filter(|instance| instance.status == status)
            .count() as u64)
    }
}

fn sorted_books(iter: impl Iterator<Item = (RecordId, Book)>) -> Vec<BookRecord> {
    let mut records: Vec<BookRecord> = iter.map(|(id, book)| BookRecord { id, book }).collect();
    records.sort_by(|a, b| a.book.title.cmp(&b.book.title));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::{sample_author, sample_book, sample_genre, sample_instance};

    #[tokio::test]
    async fn author_crud() {
        let store = MemoryCatalogStore::new();
        let author = sample_author("Bram", "Stoker");

        let id = store.insert_author(&author).await.unwrap();
        let record = store.get_author(&id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.author, author);

        let mut updated = author.clone();
        updated.first_name = "Abraham".to_string();
        assert!(store.update_author(&id, &updated).await.unwrap());
        let record = store.get_author(&id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.author.first_name, "Abraham");

        assert!(store.delete_author(&id).await.unwrap());
        assert!(store.get_author(&id).await.unwrap().is_none());
        assert!(!store.delete_author(&id).await.unwrap());
    }

    #[tokio::test]
    async fn update_missing_author_reports_absence() {
        let store = MemoryCatalogStore::new();
        let id = RecordId::new([9u8; 12]);
        assert!(!store.update_author(&id, &sample_author("A", "B")).await.unwrap());
    }

    #[tokio::test]
    async fn authors_list_sorted_by_family_name() {
        let store = MemoryCatalogStore::new();
        store.insert_author(&sample_author("Patrick", "Rothfuss")).await.unwrap();
        store.insert_author(&sample_author("Ben", "Bova")).await.unwrap();
        store.insert_author(&sample_author("Isaac", "Asimov")).await.unwrap();

        let names: Vec<String> = store
            .list_authors()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.author.family_name)
            .collect();
        assert_eq!(names, vec!["Asimov", "Bova", "Rothfuss"]);
    }

    #[tokio::test]
    async fn genre_lookup_by_name() {
        let store = MemoryCatalogStore::new();
        let id = store.insert_genre(&sample_genre("Fantasy")).await.unwrap();

        let found = store.find_genre_by_name("Fantasy").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(store.find_genre_by_name("Horror").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn books_found_by_author_and_genre() {
        let store = MemoryCatalogStore::new();
        let author = store.insert_author(&sample_author("Bram", "Stoker")).await.unwrap();
        let other = store.insert_author(&sample_author("Isaac", "Asimov")).await.unwrap();
        let gothic = store.insert_genre(&sample_genre("Gothic")).await.unwrap();

        store.insert_book(&sample_book("Dracula", author, vec![gothic])).await.unwrap();
        store
            .insert_book(&sample_book("The Lair of the White Worm", author, vec![]))
            .await
            .unwrap();
        store.insert_book(&sample_book("Foundation", other, vec![])).await.unwrap();

        let by_author = store.find_books_by_author(&author).await.unwrap();
        assert_eq!(by_author.len(), 2);
        assert_eq!(by_author[0].book.title, "Dracula");

        let by_genre = store.find_books_by_genre(&gothic).await.unwrap();
        assert_eq!(by_genre.len(), 1);
        assert_eq!(by_genre[0].book.title, "Dracula");
    }

    #[tokio::test]
    async fn instances_found_by_book() {
        let store = MemoryCatalogStore::new();
        let author = store.insert_author(&sample_author("Bram", "Stoker")).await.unwrap();
        let book = store.insert_book(&sample_book("Dracula", author, vec![])).await.unwrap();
        let other = store.insert_book(&sample_book("Foundation", author, vec![])).await.unwrap();

        store.insert_book_instance(&sample_instance(book)).await.unwrap();
        store.insert_book_instance(&sample_instance(book)).await.unwrap();
        store.insert_book_instance(&sample_instance(other)).await.unwrap();

        assert_eq!(store.find_book_instances_by_book(&book).await.unwrap().len(), 2);
        assert_eq!(store.count_book_instances().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn status_counts() {
        let store = MemoryCatalogStore::new();
        let author = store.insert_author(&sample_author("Bram", "Stoker")).await.unwrap();
        let book = store.insert_book(&sample_book("Dracula", author, vec![])).await.unwrap();

        let mut available = sample_instance(book);
        available.status = LoanStatus::Available;
        store.insert_book_instance(&available).await.unwrap();
        store.insert_book_instance(&sample_instance(book)).await.unwrap();

        assert_eq!(
            store
                .count_book_instances_with_status(LoanStatus::Available)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .count_book_instances_with_status(LoanStatus::Loaned)
                .await
                .unwrap(),
            0
        );
    }
}
