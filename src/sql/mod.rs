//! PostgreSQL backend for the catalog store.
//!
//! Each submodule covers one collection with free functions over a database
//! transaction, mirroring the operations of [`crate::CatalogStore`].
//! [`PgCatalogStore`] adapts them to the trait with one transaction per
//! store operation.

/// Author table operations.
pub mod author;
/// Book and book-genre join table operations.
pub mod book;
/// Book instance table operations.
pub mod book_instance;
/// Genre table operations.
pub mod genre;

mod pg_store;

pub use pg_store::PgCatalogStore;

use crate::RecordId;
use crate::store::StoreError;

/// Result type for database operations.
pub type SqlResult<T> = Result<T, StoreError>;

pub(crate) fn internal(context: &str, err: sqlx::Error) -> StoreError {
    eprintln!("database error {}: {}", context, err);
    StoreError::Internal(err.to_string())
}

pub(crate) fn row_error(err: sqlx::Error) -> StoreError {
    eprintln!("database error reading row: {}", err);
    StoreError::Internal(err.to_string())
}

pub(crate) fn record_id_from_bytes(bytes: &[u8]) -> SqlResult<RecordId> {
    let bytes: [u8; 12] = bytes
        .try_into()
        .map_err(|_| StoreError::Internal("invalid record id length".to_string()))?;
    Ok(RecordId::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_from_bytes_requires_twelve() {
        assert!(record_id_from_bytes(&[0u8; 12]).is_ok());
        assert!(record_id_from_bytes(&[0u8; 11]).is_err());
        assert!(record_id_from_bytes(&[0u8; 13]).is_err());
    }
}
