use axum::extract::{Path, RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::book::BookSummary;
use crate::forms::{FieldError, FormErrors, FormFields, clean};
use crate::integrity;
use crate::record_id::parse_path_id;
use crate::store::{SharedStore, store_failure};
use crate::RecordId;

//////////////////////////////////////////////// Genre ////////////////////////////////////////////////

/// Stored fields of a genre record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    /// Genre name. Uniqueness is checked by lookup before insert, not
    /// enforced by the store.
    pub name: String,
}

/// A genre together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreRecord {
    /// The record identity.
    pub id: RecordId,
    /// The stored fields.
    #[serde(flatten)]
    pub genre: Genre,
}

///////////////////////////////////////// Computed Fields /////////////////////////////////////////////

/// Canonical resource path for a genre record.
pub fn url(id: &RecordId) -> String {
    format!("/genre/{}", id)
}

/// The genre data object handed to the view renderer. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreView {
    /// The record identity.
    pub id: RecordId,
    /// Stored name.
    pub name: String,
    /// Canonical resource path.
    pub url: String,
}

impl GenreView {
    /// Assembles the view for one stored record.
    pub fn from_record(record: &GenreRecord) -> GenreView {
        GenreView {
            id: record.id,
            name: record.genre.name.clone(),
            url: url(&record.id),
        }
    }
}

//////////////////////////////////////////////// Form /////////////////////////////////////////////////

/// Cleaned values of a submitted genre form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreForm {
    /// Trimmed and escaped genre name.
    pub name: String,
}

impl GenreForm {
    /// Applies the genre rule table to one submission.
    pub fn validate(fields: &FormFields) -> (GenreForm, Vec<FieldError>) {
        let mut errors = FormErrors::new();

        let name = clean(fields.first("name").unwrap_or(""));
        if errors.required("name", &name, "Genre name required") {
            if errors.min_length(
                "name",
                &name,
                3,
                "Genre name must contain at least 3 characters",
            ) {
                errors.max_length("name", &name, 100, "Genre name must not exceed 100 characters");
            }
        }

        (GenreForm { name }, errors.into_vec())
    }

    /// Converts a validated form into the stored payload.
    pub fn into_genre(self) -> Genre {
        Genre { name: self.name }
    }
}

////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// Page object for the genre list.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenreListPage {
    /// Page title.
    pub title: String,
    /// All genres, in name order.
    pub genres: Vec<GenreView>,
}

/// Page object for a genre's detail view.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenreDetailPage {
    /// Page title.
    pub title: String,
    /// The genre on display.
    pub genre: GenreView,
    /// Books whose genre set contains this genre.
    pub genre_books: Vec<BookSummary>,
}

/// Page object for the genre create/update form.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenreFormPage {
    /// Page title.
    pub title: String,
    /// Values to pre-fill, absent on a fresh create form.
    pub genre: Option<GenreForm>,
    /// Field-level validation errors from the last submission.
    pub errors: Vec<FieldError>,
}

/// Page object for the genre delete confirmation.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenreDeletePage {
    /// Page title.
    pub title: String,
    /// The genre staged for deletion.
    pub genre: Option<GenreView>,
    /// Books blocking the deletion; deletion proceeds only when empty.
    pub books: Vec<BookSummary>,
}

async fn genre_list(
    State(store): State<SharedStore>,
) -> Result<Json<GenreListPage>, (StatusCode, &'static str)> {
    let genres = store.list_genres().await.map_err(store_failure)?;
    Ok(Json(GenreListPage {
        title: "Genre List".to_string(),
        genres: genres.iter().map(GenreView::from_record).collect(),
    }))
}

async fn genre_detail(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<GenreDetailPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Genre not found")?;
    let (genre, books) = tokio::join!(store.get_genre(&id), store.find_books_by_genre(&id));
    let genre = genre
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Genre not found"))?;
    let books = books.map_err(store_failure)?;
    Ok(Json(GenreDetailPage {
        title: "Genre Detail".to_string(),
        genre: GenreView::from_record(&genre),
        genre_books: books.iter().map(BookSummary::from_record).collect(),
    }))
}

async fn genre_create_get() -> Json<GenreFormPage> {
    Json(GenreFormPage {
        title: "Create Genre".to_string(),
        genre: None,
        errors: Vec::new(),
    })
}

async fn genre_create_post(
    State(store): State<SharedStore>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let fields = FormFields::parse(&body);
    let (form, errors) = GenreForm::validate(&fields);

    if !errors.is_empty() {
        let page = GenreFormPage {
            title: "Create Genre".to_string(),
            genre: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    // A genre with this name may already exist; point at it instead of
    // inserting a duplicate. Check-then-insert is not atomic (accepted race).
    let existing = store
        .find_genre_by_name(&form.name)
        .await
        .map_err(store_failure)?;
    if let Some(existing) = existing {
        return Ok(Redirect::to(&url(&existing.id)).into_response());
    }

    let id = store
        .insert_genre(&form.into_genre())
        .await
        .map_err(store_failure)?;
    Ok(Redirect::to(&url(&id)).into_response())
}

async fn genre_delete_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Genre not found")?;
    let (genre, books) = tokio::join!(store.get_genre(&id), store.find_books_by_genre(&id));
    let genre = genre.map_err(store_failure)?;
    let books = books.map_err(store_failure)?;

    let Some(genre) = genre else {
        return Ok(Redirect::to("/genres").into_response());
    };

    let page = GenreDeletePage {
        title: "Delete Genre".to_string(),
        genre: Some(GenreView::from_record(&genre)),
        books: books.iter().map(BookSummary::from_record).collect(),
    };
    Ok(Json(page).into_response())
}

async fn genre_delete_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Genre not found")?;
    let check = integrity::check_genre_delete(store.as_ref(), &id)
        .await
        .map_err(store_failure)?;

    if !check.allowed {
        let genre = store.get_genre(&id).await.map_err(store_failure)?;
        let page = GenreDeletePage {
            title: "Delete Genre".to_string(),
            genre: genre.as_ref().map(GenreView::from_record),
            books: check.blockers.iter().map(BookSummary::from_record).collect(),
        };
        return Ok((StatusCode::CONFLICT, Json(page)).into_response());
    }

    store.delete_genre(&id).await.map_err(store_failure)?;
    Ok(Redirect::to("/genres").into_response())
}

async fn genre_update_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<GenreFormPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Genre not found")?;
    let genre = store
        .get_genre(&id)
        .await
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Genre not found"))?;
    Ok(Json(GenreFormPage {
        title: "Update Genre".to_string(),
        genre: Some(GenreForm {
            name: genre.genre.name,
        }),
        errors: Vec::new(),
    }))
}

async fn genre_update_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Genre not found")?;
    let fields = FormFields::parse(&body);
    let (form, errors) = GenreForm::validate(&fields);

    if !errors.is_empty() {
        let page = GenreFormPage {
            title: "Update Genre".to_string(),
            genre: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let updated = store
        .update_genre(&id, &form.into_genre())
        .await
        .map_err(store_failure)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Genre not found"));
    }
    Ok(Redirect::to(&url(&id)).into_response())
}

////////////////////////////////////////////// Router /////////////////////////////////////////////////

/// Creates the genre routes backed by the given store.
pub fn create_genre_router(store: SharedStore) -> Router {
    Router::new()
        .route("/genres", get(genre_list))
        .route("/genre", get(|| async { Redirect::to("/genres") }))
        .route("/genre/create", get(genre_create_get).post(genre_create_post))
        .route("/genre/:id", get(genre_detail))
        .route(
            "/genre/:id/update",
            get(genre_update_get).post(genre_update_post),
        )
        .route(
            "/genre/:id/delete",
            get(genre_delete_get).post(genre_delete_post),
        )
        .with_state(store)
}
