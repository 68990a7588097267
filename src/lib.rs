//! # Stacks: a Library Catalog Service
//!
//! Stacks is the management backend for a small library: staff browse,
//! create, update, and delete records for authors, books, genres, and
//! physical copies (book instances), with basic relational integrity
//! maintained across them. Every mutation arrives as a form submission,
//! passes a per-field validation and sanitization pipeline, and either
//! persists and redirects to the record's canonical URL or re-renders the
//! form with field-level error messages.
//!
//! ## Core concepts
//!
//! ### Records and references
//! Each record carries a store-assigned [`RecordId`] (24 hex characters,
//! immutable after creation). Books reference exactly one author and any
//! number of genres; book instances reference exactly one book. References
//! are resolved at read time, and a broken reference renders as missing
//! rather than failing the request.
//!
//! ### Validation
//! Submitted fields run an ordered rule chain: trim, emptiness, length
//! bounds, character class, and ISO-8601 date coercion, with falsy-skips
//! semantics for optional fields. The pipeline returns cleaned values along
//! with the error list, so a failed submission re-renders the form
//! pre-filled. Multi-valued fields are normalized to a list up front
//! (absent, single, and repeated submissions).
//!
//! ### Integrity
//! An author or genre with dependent books cannot be deleted; the delete
//! flow presents the blocking books instead. The check and the delete are
//! separate store reads with no lock between them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HTTP routes (Axum, one router per type) │
//! ├─────────────────────────────────────────┤
//! │ Form pipeline (validate + sanitize)     │
//! ├─────────────────────────────────────────┤
//! │ Integrity guard (pre-delete checks)     │
//! ├─────────────────────────────────────────┤
//! │ Catalog store (trait-based abstraction) │
//! ├─────────────────────────────────────────┤
//! │ Backends (in-memory / PostgreSQL)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage examples
//!
//! ### Validating a submission
//!
//! ```rust
//! use stacks::AuthorForm;
//! use stacks::forms::FormFields;
//!
//! let fields = FormFields::parse(
//!     b"first_name=Bram&family_name=Stoker&date_of_birth=1847-11-08&date_of_death=",
//! );
//! let (form, errors) = AuthorForm::validate(&fields);
//! assert!(errors.is_empty());
//!
//! let author = form.into_author();
//! assert_eq!(stacks::author::full_name(&author), "Stoker, Bram");
//! assert_eq!(stacks::author::lifespan(&author), "1847 - ");
//! ```
//!
//! ### Running the catalog over the in-memory store
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stacks::{MemoryCatalogStore, create_catalog_router};
//!
//! # async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryCatalogStore::new());
//! let app = create_catalog_router(store);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

/// Author records: stored fields, computed display fields, forms, routes.
pub mod author;

/// Book records: stored fields, reference resolution, forms, routes.
pub mod book;

/// Physical copies: loan status, stored fields, forms, routes.
pub mod book_instance;

/// The catalog home page and its parallel count fan-out.
pub mod catalog;

/// Date parsing and display formatting.
pub mod dates;

/// The form-field map, sanitizers, and per-field validation rules.
pub mod forms;

/// Genre records: stored fields, duplicate-name handling, forms, routes.
pub mod genre;

/// The referential-integrity guard consulted before deletions.
pub mod integrity;

/// The storage trait, its errors, and the in-memory backend.
pub mod store;

/// The PostgreSQL backend.
pub mod sql;

mod record_id;
mod router;
mod test_utils;

/// Command-line interface utilities for program termination and output
/// formatting.
pub mod cli_utils;

/// Command handlers for the stackctl CLI application.
pub mod commands;

/// HTTP client utilities for interacting with a running catalog daemon.
pub mod http_utils;

pub use author::{
    Author, AuthorDeletePage, AuthorDetailPage, AuthorForm, AuthorFormPage, AuthorListPage,
    AuthorRecord, AuthorView, create_author_router,
};
pub use book::{
    Book, BookDeletePage, BookDetailPage, BookForm, BookFormPage, BookListPage, BookListRow,
    BookRecord, BookSummary, BookView, GenreCheckbox, create_book_router, populate_book,
};
pub use book_instance::{
    BookInstance, BookInstanceDeletePage, BookInstanceDetailPage, BookInstanceForm,
    BookInstanceFormPage, BookInstanceListPage, BookInstanceRecord, BookInstanceView, LoanStatus,
    LoanStatusParseError, create_book_instance_router,
};
pub use catalog::{CatalogCounts, IndexPage, create_index_router};
pub use forms::{FieldError, FormErrors, FormFields, RawValue, clean, escape, to_list};
pub use genre::{
    Genre, GenreDeletePage, GenreDetailPage, GenreForm, GenreFormPage, GenreListPage, GenreRecord,
    GenreView, create_genre_router,
};
pub use integrity::{DeletionCheck, check_author_delete, check_genre_delete};
pub use record_id::{RecordId, RecordIdParseError};
pub use router::create_catalog_router;
pub use sql::PgCatalogStore;
pub use store::{CatalogStore, MemoryCatalogStore, SharedStore, StoreError};
