//! The catalog home page: record counts gathered with one parallel fan-out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::store::{SharedStore, store_failure};
use crate::LoanStatus;

/// Record counts shown on the catalog home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCounts {
    /// Number of books.
    pub book_count: u64,
    /// Number of physical copies.
    pub book_instance_count: u64,
    /// Number of copies currently available.
    pub book_instance_available_count: u64,
    /// Number of authors.
    pub author_count: u64,
    /// Number of genres.
    pub genre_count: u64,
}

/// Page object for the catalog home.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPage {
    /// Page title.
    pub title: String,
    /// The gathered counts.
    pub data: CatalogCounts,
}

async fn index(
    State(store): State<SharedStore>,
) -> Result<Json<IndexPage>, (StatusCode, &'static str)> {
    // Five independent reads, joined before rendering; any failure
    // short-circuits to the error path.
    let (books, instances, available, authors, genres) = tokio::join!(
        store.count_books(),
        store.count_book_instances(),
        store.count_book_instances_with_status(LoanStatus::Available),
        store.count_authors(),
        store.count_genres(),
    );

    let data = CatalogCounts {
        book_count: books.map_err(store_failure)?,
        book_instance_count: instances.map_err(store_failure)?,
        book_instance_available_count: available.map_err(store_failure)?,
        author_count: authors.map_err(store_failure)?,
        genre_count: genres.map_err(store_failure)?,
    };
    Ok(Json(IndexPage {
        title: "Local Library Home".to_string(),
        data,
    }))
}

/// Creates the home route backed by the given store.
pub fn create_index_router(store: SharedStore) -> Router {
    Router::new().route("/", get(index)).with_state(store)
}
