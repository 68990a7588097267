use axum::extract::{Path, RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::author::AuthorView;
use crate::book_instance::BookInstanceView;
use crate::forms::{FieldError, FormErrors, FormFields, clean};
use crate::genre::GenreView;
use crate::record_id::parse_path_id;
use crate::store::{CatalogStore, SharedStore, StoreError, store_failure};
use crate::RecordId;

//////////////////////////////////////////////// Book /////////////////////////////////////////////////

/// Stored fields of a book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Book title.
    pub title: String,
    /// Reference to the book's author. Resolved at read time; a broken
    /// reference renders as missing.
    pub author: RecordId,
    /// Summary text.
    pub summary: String,
    /// ISBN text.
    pub isbn: String,
    /// References to zero or more genres.
    pub genre: Vec<RecordId>,
}

/// A book together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// The record identity.
    pub id: RecordId,
    /// The stored fields.
    #[serde(flatten)]
    pub book: Book,
}

///////////////////////////////////////// Computed Fields /////////////////////////////////////////////

/// Canonical resource path for a book record.
pub fn url(id: &RecordId) -> String {
    format!("/book/{}", id)
}

/// Abbreviated book view used when listing dependent records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    /// The record identity.
    pub id: RecordId,
    /// Stored title.
    pub title: String,
    /// Stored summary.
    pub summary: String,
    /// Canonical resource path.
    pub url: String,
}

impl BookSummary {
    /// Assembles the summary for one stored record.
    pub fn from_record(record: &BookRecord) -> BookSummary {
        BookSummary {
            id: record.id,
            title: record.book.title.clone(),
            summary: record.book.summary.clone(),
            url: url(&record.id),
        }
    }
}

/// A row of the book list: the stored title plus its resolved author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookListRow {
    /// The record identity.
    pub id: RecordId,
    /// Stored title.
    pub title: String,
    /// Canonical resource path.
    pub url: String,
    /// The resolved author, missing when the reference is broken.
    pub author: Option<AuthorView>,
}

/// The fully resolved book data object for the detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookView {
    /// The record identity.
    pub id: RecordId,
    /// Stored title.
    pub title: String,
    /// Stored summary.
    pub summary: String,
    /// Stored ISBN.
    pub isbn: String,
    /// Canonical resource path.
    pub url: String,
    /// The resolved author, missing when the reference is broken.
    pub author: Option<AuthorView>,
    /// The resolved genres; broken references are dropped.
    pub genre: Vec<GenreView>,
}

/// Resolves a book's author and genre references for rendering.
///
/// Broken references render as missing rather than failing the request.
pub async fn populate_book(
    store: &dyn CatalogStore,
    record: &BookRecord,
) -> Result<BookView, StoreError> {
    let author = store.get_author(&record.book.author).await?;
    let mut genres = Vec::new();
    for genre_id in &record.book.genre {
        if let Some(genre) = store.get_genre(genre_id).await? {
            genres.push(GenreView::from_record(&genre));
        }
    }
    Ok(BookView {
        id: record.id,
        title: record.book.title.clone(),
        summary: record.book.summary.clone(),
        isbn: record.book.isbn.clone(),
        url: url(&record.id),
        author: author.as_ref().map(AuthorView::from_record),
        genre: genres,
    })
}

//////////////////////////////////////////////// Form /////////////////////////////////////////////////

/// Cleaned values of a submitted book form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookForm {
    /// Trimmed and escaped title.
    pub title: String,
    /// Submitted author reference.
    pub author: String,
    /// Trimmed and escaped summary.
    pub summary: String,
    /// Trimmed and escaped ISBN.
    pub isbn: String,
    /// Submitted genre references, normalized to a list.
    pub genre: Vec<String>,
}

impl BookForm {
    /// Applies the book rule table to one submission.
    ///
    /// The multi-valued `genre` field is normalized before any rule runs: an
    /// absent field is an empty set, one checkbox a singleton, several a
    /// matching list.
    pub fn validate(fields: &FormFields) -> (BookForm, Vec<FieldError>) {
        let mut errors = FormErrors::new();

        let title = clean(fields.first("title").unwrap_or(""));
        errors.required("title", &title, "Title must not be empty.");

        let author = clean(fields.first("author").unwrap_or(""));
        if errors.required("author", &author, "Author must not be empty") {
            errors.record_id("author", &author, "Invalid author reference");
        }

        let summary = clean(fields.first("summary").unwrap_or(""));
        errors.required("summary", &summary, "Summary must not be empty");

        let isbn = clean(fields.first("isbn").unwrap_or(""));
        errors.required("isbn", &isbn, "ISBN must not be empty");

        let genre: Vec<String> = fields.all("genre").iter().map(|value| clean(value)).collect();
        for value in &genre {
            if errors.record_id("genre", value, "Invalid genre reference").is_none() {
                break;
            }
        }

        let form = BookForm {
            title,
            author,
            summary,
            isbn,
            genre,
        };
        (form, errors.into_vec())
    }

    /// Pre-fills the form from a stored record for the update page.
    pub fn from_record(record: &BookRecord) -> BookForm {
        BookForm {
            title: record.book.title.clone(),
            author: record.book.author.to_string(),
            summary: record.book.summary.clone(),
            isbn: record.book.isbn.clone(),
            genre: record.book.genre.iter().map(|id| id.to_string()).collect(),
        }
    }

    /// Converts a validated form into the stored payload.
    pub fn into_book(self) -> Option<Book> {
        let author = self.author.parse().ok()?;
        let genre = self
            .genre
            .iter()
            .filter_map(|value| value.parse().ok())
            .collect();
        Some(Book {
            title: self.title,
            author,
            summary: self.summary,
            isbn: self.isbn,
            genre,
        })
    }
}

////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// A genre checkbox on the book form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreCheckbox {
    /// The genre behind the checkbox.
    #[serde(flatten)]
    pub genre: GenreView,
    /// Whether the book being edited carries this genre.
    pub checked: bool,
}

/// Page object for the book list.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookListPage {
    /// Page title.
    pub title: String,
    /// All books in title order, each with its resolved author.
    pub book_list: Vec<BookListRow>,
}

/// Page object for a book's detail view.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookDetailPage {
    /// Page title (the book's title).
    pub title: String,
    /// The fully resolved book.
    pub book: BookView,
    /// Physical copies of this book.
    pub book_instances: Vec<BookInstanceView>,
}

/// Page object for the book create/update form.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookFormPage {
    /// Page title.
    pub title: String,
    /// Every author, for the author select control.
    pub authors: Vec<AuthorView>,
    /// Every genre, with checked flags for the book being edited.
    pub genres: Vec<GenreCheckbox>,
    /// Values to pre-fill, absent on a fresh create form.
    pub book: Option<BookForm>,
    /// Field-level validation errors from the last submission.
    pub errors: Vec<FieldError>,
}

/// Page object for the book delete confirmation.
///
/// Deleting a book is never blocked; the instance list is shown so staff can
/// clear the copies first if they choose to.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookDeletePage {
    /// Page title.
    pub title: String,
    /// The book staged for deletion.
    pub book: Option<BookSummary>,
    /// Copies that still reference the book.
    pub book_instances: Vec<BookInstanceView>,
}

async fn book_list(
    State(store): State<SharedStore>,
) -> Result<Json<BookListPage>, (StatusCode, &'static str)> {
    let books = store.list_books().await.map_err(store_failure)?;
    let mut rows = Vec::with_capacity(books.len());
    for record in &books {
        let author = store
            .get_author(&record.book.author)
            .await
            .map_err(store_failure)?;
        rows.push(BookListRow {
            id: record.id,
            title: record.book.title.clone(),
            url: url(&record.id),
            author: author.as_ref().map(AuthorView::from_record),
        });
    }
    Ok(Json(BookListPage {
        title: "Book List".to_string(),
        book_list: rows,
    }))
}

async fn book_detail(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<BookDetailPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book not found")?;
    let (book, instances) = tokio::join!(
        store.get_book(&id),
        store.find_book_instances_by_book(&id)
    );
    let book = book
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Book not found"))?;
    let instances = instances.map_err(store_failure)?;

    let view = populate_book(store.as_ref(), &book).await.map_err(store_failure)?;
    Ok(Json(BookDetailPage {
        title: view.title.clone(),
        book: view,
        book_instances: instances.iter().map(BookInstanceView::from_record).collect(),
    }))
}

async fn load_form_references(
    store: &dyn CatalogStore,
) -> Result<(Vec<AuthorView>, Vec<crate::GenreRecord>), StoreError> {
    let (authors, genres) = tokio::join!(store.list_authors(), store.list_genres());
    let authors = authors?.iter().map(AuthorView::from_record).collect();
    Ok((authors, genres?))
}

fn checkboxes(genres: &[crate::GenreRecord], selected: &[String]) -> Vec<GenreCheckbox> {
    genres
        .iter()
        .map(|record| GenreCheckbox {
            genre: GenreView::from_record(record),
            checked: selected.iter().any(|value| *value == record.id.to_string()),
        })
        .collect()
}

async fn book_create_get(
    State(store): State<SharedStore>,
) -> Result<Json<BookFormPage>, (StatusCode, &'static str)> {
    let (authors, genres) = load_form_references(store.as_ref())
        .await
        .map_err(store_failure)?;
    Ok(Json(BookFormPage {
        title: "Create Book".to_string(),
        authors,
        genres: checkboxes(&genres, &[]),
        book: None,
        errors: Vec::new(),
    }))
}

async fn book_create_post(
    State(store): State<SharedStore>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let fields = FormFields::parse(&body);
    let (form, errors) = BookForm::validate(&fields);

    if !errors.is_empty() {
        let (authors, genres) = load_form_references(store.as_ref())
            .await
            .map_err(store_failure)?;
        let page = BookFormPage {
            title: "Create Book".to_string(),
            authors,
            genres: checkboxes(&genres, &form.genre),
            book: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let Some(book) = form.into_book() else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid book submission"));
    };
    let id = store.insert_book(&book).await.map_err(store_failure)?;
    Ok(Redirect::to(&url(&id)).into_response())
}

async fn book_delete_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book not found")?;
    let (book, instances) = tokio::join!(
        store.get_book(&id),
        store.find_book_instances_by_book(&id)
    );
    let book = book.map_err(store_failure)?;
    let instances = instances.map_err(store_failure)?;

    let Some(book) = book else {
        return Ok(Redirect::to("/books").into_response());
    };

    let page = BookDeletePage {
        title: "Delete Book".to_string(),
        book: Some(BookSummary::from_record(&book)),
        book_instances: instances.iter().map(BookInstanceView::from_record).collect(),
    };
    Ok(Json(page).into_response())
}

async fn book_delete_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book not found")?;
    store.delete_book(&id).await.map_err(store_failure)?;
    Ok(Redirect::to("/books").into_response())
}

async fn book_update_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<BookFormPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book not found")?;
    let book = store
        .get_book(&id)
        .await
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Book not found"))?;
    let (authors, genres) = load_form_references(store.as_ref())
        .await
        .map_err(store_failure)?;

    let form = BookForm::from_record(&book);
    Ok(Json(BookFormPage {
        title: "Update Book".to_string(),
        authors,
        genres: checkboxes(&genres, &form.genre),
        book: Some(form),
        errors: Vec::new(),
    }))
}

async fn book_update_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book not found")?;
    let fields = FormFields::parse(&body);
    let (form, errors) = BookForm::validate(&fields);

    if !errors.is_empty() {
        let (authors, genres) = load_form_references(store.as_ref())
            .await
            .map_err(store_failure)?;
        let page = BookFormPage {
            title: "Update Book".to_string(),
            authors,
            genres: checkboxes(&genres, &form.genre),
            book: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let Some(book) = form.into_book() else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid book submission"));
    };
    let updated = store.update_book(&id, &book).await.map_err(store_failure)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Book not found"));
    }
    Ok(Redirect::to(&url(&id)).into_response())
}

////////////////////////////////////////////// Router /////////////////////////////////////////////////

/// Creates the book routes backed by the given store.
pub fn create_book_router(store: SharedStore) -> Router {
    Router::new()
        .route("/books", get(book_list))
        .route("/book", get(|| async { Redirect::to("/books") }))
        .route("/book/create", get(book_create_get).post(book_create_post))
        .route("/book/:id", get(book_detail))
        .route("/book/:id/update", get(book_update_get).post(book_update_post))
        .route("/book/:id/delete", get(book_delete_get).post(book_delete_post))
        .with_state(store)
}
