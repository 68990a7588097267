use axum::Router;

use crate::author::create_author_router;
use crate::book::create_book_router;
use crate::book_instance::create_book_instance_router;
use crate::catalog::create_index_router;
use crate::genre::create_genre_router;
use crate::store::SharedStore;

/// Composes the full catalog route table over one shared store.
pub fn create_catalog_router(store: SharedStore) -> Router {
    Router::new()
        .merge(create_index_router(store.clone()))
        .merge(create_author_router(store.clone()))
        .merge(create_genre_router(store.clone()))
        .merge(create_book_router(store.clone()))
        .merge(create_book_instance_router(store))
}
