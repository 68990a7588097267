//! # Referential-Integrity Guard
//!
//! Deletion of an author or genre is gated on the books that reference it:
//! the guard reports the blocking records and the orchestrator re-renders
//! the confirmation page instead of deleting. The check and the eventual
//! delete are separate store calls with no lock between them; a dependent
//! created in that window is an accepted race.

use crate::store::{CatalogStore, StoreError};
use crate::{BookRecord, RecordId};

/// Outcome of a pre-deletion integrity check.
#[derive(Debug, Clone)]
pub struct DeletionCheck {
    /// Whether the deletion may proceed.
    pub allowed: bool,
    /// The records blocking it, empty when allowed.
    pub blockers: Vec<BookRecord>,
}

/// Checks whether an author may be deleted.
pub async fn check_author_delete(
    store: &dyn CatalogStore,
    id: &RecordId,
) -> Result<DeletionCheck, StoreError> {
    let blockers = store.find_books_by_author(id).await?;
    Ok(DeletionCheck {
        allowed: blockers.is_empty(),
        blockers,
    })
}

/// Checks whether a genre may be deleted.
pub async fn check_genre_delete(
    store: &dyn CatalogStore,
    id: &RecordId,
) -> Result<DeletionCheck, StoreError> {
    let blockers = store.find_books_by_genre(id).await?;
    Ok(DeletionCheck {
        allowed: blockers.is_empty(),
        blockers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCatalogStore;
    use crate::test_utils::test_helpers::{sample_author, sample_book, sample_genre};

    #[tokio::test]
    async fn author_with_books_is_blocked() {
        let store = MemoryCatalogStore::new();
        let author = store.insert_author(&sample_author("Bram", "Stoker")).await.unwrap();
        store.insert_book(&sample_book("Dracula", author, vec![])).await.unwrap();

        let check = check_author_delete(&store, &author).await.unwrap();
        assert!(!check.allowed);
        assert_eq!(check.blockers.len(), 1);
        assert_eq!(check.blockers[0].book.title, "Dracula");
    }

    #[tokio::test]
    async fn author_without_books_is_allowed() {
        let store = MemoryCatalogStore::new();
        let author = store.insert_author(&sample_author("Bram", "Stoker")).await.unwrap();

        let check = check_author_delete(&store, &author).await.unwrap();
        assert!(check.allowed);
        assert!(check.blockers.is_empty());
    }

    #[tokio::test]
    async fn genre_in_use_is_blocked() {
        let store = MemoryCatalogStore::new();
        let author = store.insert_author(&sample_author("Bram", "Stoker")).await.unwrap();
        let genre = store.insert_genre(&sample_genre("Gothic")).await.unwrap();
        store
            .insert_book(&sample_book("Dracula", author, vec![genre]))
            .await
            .unwrap();

        let check = check_genre_delete(&store, &genre).await.unwrap();
        assert!(!check.allowed);
        assert_eq!(check.blockers.len(), 1);
    }

    #[tokio::test]
    async fn unused_genre_is_allowed() {
        let store = MemoryCatalogStore::new();
        let genre = store.insert_genre(&sample_genre("Gothic")).await.unwrap();

        let check = check_genre_delete(&store, &genre).await.unwrap();
        assert!(check.allowed);
    }

    #[tokio::test]
    async fn unknown_author_is_trivially_allowed() {
        let store = MemoryCatalogStore::new();
        let check = check_author_delete(&store, &RecordId::new([9u8; 12])).await.unwrap();
        assert!(check.allowed);
    }
}
