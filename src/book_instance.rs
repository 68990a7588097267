use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use axum::extract::{Path, RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::book::BookSummary;
use crate::dates::{format_date_med, parse_iso_date};
use crate::forms::{FieldError, FormErrors, FormFields, clean};
use crate::record_id::parse_path_id;
use crate::store::{CatalogStore, SharedStore, StoreError, store_failure};
use crate::RecordId;

////////////////////////////////////////////// LoanStatus /////////////////////////////////////////////

/// The circulation status of a physical copy.
///
/// These four values are the only ones the store will ever hold; anything
/// else is rejected at validation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// On the shelf and available to borrow.
    Available,
    /// Held back for upkeep.
    Maintenance,
    /// Checked out to a borrower.
    Loaned,
    /// Reserved for a borrower.
    Reserved,
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl Display for LoanStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let text = match self {
            LoanStatus::Available => "Available",
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::Loaned => "Loaned",
            LoanStatus::Reserved => "Reserved",
        };
        write!(f, "{}", text)
    }
}

/// Error returned when parsing a status outside the enumerated values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanStatusParseError {
    invalid: String,
}

impl Display for LoanStatusParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Invalid status {:?}. Status must be one of Available, Maintenance, Loaned, Reserved",
            self.invalid
        )
    }
}

impl std::error::Error for LoanStatusParseError {}

impl FromStr for LoanStatus {
    type Err = LoanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(LoanStatus::Available),
            "Maintenance" => Ok(LoanStatus::Maintenance),
            "Loaned" => Ok(LoanStatus::Loaned),
            "Reserved" => Ok(LoanStatus::Reserved),
            _ => Err(LoanStatusParseError {
                invalid: s.to_string(),
            }),
        }
    }
}

///////////////////////////////////////////// BookInstance ////////////////////////////////////////////

/// Stored fields of a physical copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstance {
    /// Reference to the copy's book. Resolved at read time; a broken
    /// reference renders as missing.
    pub book: RecordId,
    /// Publisher imprint of this copy.
    pub imprint: String,
    /// Circulation status.
    pub status: LoanStatus,
    /// When the copy is due back.
    pub due_back: NaiveDate,
}

/// A copy together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstanceRecord {
    /// The record identity.
    pub id: RecordId,
    /// The stored fields.
    #[serde(flatten)]
    pub instance: BookInstance,
}

///////////////////////////////////////// Computed Fields /////////////////////////////////////////////

/// Canonical resource path for a book instance record.
pub fn url(id: &RecordId) -> String {
    format!("/bookinstance/{}", id)
}

/// The copy data object handed to the view renderer. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookInstanceView {
    /// The record identity.
    pub id: RecordId,
    /// Stored imprint.
    pub imprint: String,
    /// Stored status.
    pub status: LoanStatus,
    /// Stored due-back date.
    pub due_back: NaiveDate,
    /// Due-back date formatted for display.
    pub due_back_formatted: String,
    /// Canonical resource path.
    pub url: String,
    /// The resolved book, missing when the reference is broken or the view
    /// is rendered in a context that already knows the book.
    pub book: Option<BookSummary>,
}

impl BookInstanceView {
    /// Assembles the view for one stored record, without resolving the book.
    pub fn from_record(record: &BookInstanceRecord) -> BookInstanceView {
        BookInstanceView {
            id: record.id,
            imprint: record.instance.imprint.clone(),
            status: record.instance.status,
            due_back: record.instance.due_back,
            due_back_formatted: format_date_med(record.instance.due_back),
            url: url(&record.id),
            book: None,
        }
    }

    /// Assembles the view with the book reference resolved.
    pub async fn populate(
        store: &dyn CatalogStore,
        record: &BookInstanceRecord,
    ) -> Result<BookInstanceView, StoreError> {
        let book = store.get_book(&record.instance.book).await?;
        let mut view = BookInstanceView::from_record(record);
        view.book = book.as_ref().map(BookSummary::from_record);
        Ok(view)
    }
}

//////////////////////////////////////////////// Form /////////////////////////////////////////////////

/// Cleaned values of a submitted book instance form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookInstanceForm {
    /// Submitted book reference.
    pub book: String,
    /// Trimmed and escaped imprint.
    pub imprint: String,
    /// Submitted status text; empty means the default.
    pub status: String,
    /// Submitted due-back text; empty means the default.
    pub due_back: String,
}

impl BookInstanceForm {
    /// Applies the book instance rule table to one submission.
    ///
    /// `status` and `due_back` have falsy-skips semantics: empty values fall
    /// back to the model defaults (Maintenance, today) instead of failing.
    pub fn validate(fields: &FormFields) -> (BookInstanceForm, Vec<FieldError>) {
        let mut errors = FormErrors::new();

        let book = clean(fields.first("book").unwrap_or(""));
        if errors.required("book", &book, "Book must be specified") {
            errors.record_id("book", &book, "Invalid book reference");
        }

        let imprint = clean(fields.first("imprint").unwrap_or(""));
        errors.required("imprint", &imprint, "Imprint must be specified");

        let status = fields.first("status").unwrap_or("").trim().to_string();
        if !status.is_empty() && LoanStatus::from_str(&status).is_err() {
            errors.push("status", "Invalid status");
        }

        let due_back = fields.first("due_back").unwrap_or("").trim().to_string();
        errors.optional_date("due_back", &due_back, "Invalid date");

        let form = BookInstanceForm {
            book,
            imprint,
            status,
            due_back,
        };
        (form, errors.into_vec())
    }

    /// Pre-fills the form from a stored record for the update page.
    pub fn from_record(record: &BookInstanceRecord) -> BookInstanceForm {
        BookInstanceForm {
            book: record.instance.book.to_string(),
            imprint: record.instance.imprint.clone(),
            status: record.instance.status.to_string(),
            due_back: record.instance.due_back.to_string(),
        }
    }

    /// Converts a validated form into the stored payload.
    pub fn into_instance(self) -> Option<BookInstance> {
        let book = self.book.parse().ok()?;
        let status = if self.status.is_empty() {
            LoanStatus::default()
        } else {
            self.status.parse().ok()?
        };
        let due_back = if self.due_back.is_empty() {
            Utc::now().date_naive()
        } else {
            parse_iso_date(&self.due_back)?
        };
        Some(BookInstance {
            book,
            imprint: self.imprint,
            status,
            due_back,
        })
    }
}

////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// Page object for the book instance list.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookInstanceListPage {
    /// Page title.
    pub title: String,
    /// All copies, each with its resolved book.
    pub bookinstance_list: Vec<BookInstanceView>,
}

/// Page object for a copy's detail view.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookInstanceDetailPage {
    /// Page title.
    pub title: String,
    /// The copy on display, with its resolved book.
    pub bookinstance: BookInstanceView,
}

/// Page object for the book instance create/update form.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookInstanceFormPage {
    /// Page title.
    pub title: String,
    /// Every book, for the book select control.
    pub book_list: Vec<BookSummary>,
    /// The book currently selected on the form.
    pub selected_book: Option<String>,
    /// Values to pre-fill, absent on a fresh create form.
    pub bookinstance: Option<BookInstanceForm>,
    /// Field-level validation errors from the last submission.
    pub errors: Vec<FieldError>,
}

/// Page object for the book instance delete confirmation.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookInstanceDeletePage {
    /// Page title.
    pub title: String,
    /// The copy staged for deletion, with its resolved book.
    pub bookinstance: BookInstanceView,
}

async fn bookinstance_list(
    State(store): State<SharedStore>,
) -> Result<Json<BookInstanceListPage>, (StatusCode, &'static str)> {
    let instances = store.list_book_instances().await.map_err(store_failure)?;
    let mut views = Vec::with_capacity(instances.len());
    for record in &instances {
        views.push(
            BookInstanceView::populate(store.as_ref(), record)
                .await
                .map_err(store_failure)?,
        );
    }
    Ok(Json(BookInstanceListPage {
        title: "Book Instance List".to_string(),
        bookinstance_list: views,
    }))
}

async fn bookinstance_detail(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<BookInstanceDetailPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book copy not found")?;
    let record = store
        .get_book_instance(&id)
        .await
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Book copy not found"))?;
    let view = BookInstanceView::populate(store.as_ref(), &record)
        .await
        .map_err(store_failure)?;

    let title = match &view.book {
        Some(book) => format!("Copy: {}", book.title),
        None => "Copy".to_string(),
    };
    Ok(Json(BookInstanceDetailPage {
        title,
        bookinstance: view,
    }))
}

async fn book_choices(store: &dyn CatalogStore) -> Result<Vec<BookSummary>, StoreError> {
    let books = store.list_books().await?;
    Ok(books.iter().map(BookSummary::from_record).collect())
}

async fn bookinstance_create_get(
    State(store): State<SharedStore>,
) -> Result<Json<BookInstanceFormPage>, (StatusCode, &'static str)> {
    let book_list = book_choices(store.as_ref()).await.map_err(store_failure)?;
    Ok(Json(BookInstanceFormPage {
        title: "Create BookInstance".to_string(),
        book_list,
        selected_book: None,
        bookinstance: None,
        errors: Vec::new(),
    }))
}

async fn bookinstance_create_post(
    State(store): State<SharedStore>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let fields = FormFields::parse(&body);
    let (form, errors) = BookInstanceForm::validate(&fields);

    if !errors.is_empty() {
        let book_list = book_choices(store.as_ref()).await.map_err(store_failure)?;
        let page = BookInstanceFormPage {
            title: "Create BookInstance".to_string(),
            book_list,
            selected_book: Some(form.book.clone()),
            bookinstance: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let Some(instance) = form.into_instance() else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid copy submission"));
    };
    let id = store
        .insert_book_instance(&instance)
        .await
        .map_err(store_failure)?;
    Ok(Redirect::to(&url(&id)).into_response())
}

async fn bookinstance_delete_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book copy not found")?;
    let record = store.get_book_instance(&id).await.map_err(store_failure)?;

    let Some(record) = record else {
        return Ok(Redirect::to("/bookinstances").into_response());
    };

    let view = BookInstanceView::populate(store.as_ref(), &record)
        .await
        .map_err(store_failure)?;
    let page = BookInstanceDeletePage {
        title: "Delete BookInstance".to_string(),
        bookinstance: view,
    };
    Ok(Json(page).into_response())
}

async fn bookinstance_delete_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book copy not found")?;
    store.delete_book_instance(&id).await.map_err(store_failure)?;
    Ok(Redirect::to("/bookinstances").into_response())
}

async fn bookinstance_update_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<BookInstanceFormPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book copy not found")?;
    let (record, books) = tokio::join!(store.get_book_instance(&id), store.list_books());
    let record = record
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Book copy not found"))?;
    let books = books.map_err(store_failure)?;

    let form = BookInstanceForm::from_record(&record);
    Ok(Json(BookInstanceFormPage {
        title: "Update BookInstance".to_string(),
        book_list: books.iter().map(BookSummary::from_record).collect(),
        selected_book: Some(form.book.clone()),
        bookinstance: Some(form),
        errors: Vec::new(),
    }))
}

async fn bookinstance_update_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Book copy not found")?;
    let fields = FormFields::parse(&body);
    let (form, errors) = BookInstanceForm::validate(&fields);

    // A failed validation terminates this attempt; the store is not written.
    if !errors.is_empty() {
        let book_list = book_choices(store.as_ref()).await.map_err(store_failure)?;
        let page = BookInstanceFormPage {
            title: "Update BookInstance".to_string(),
            book_list,
            selected_book: Some(form.book.clone()),
            bookinstance: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let Some(instance) = form.into_instance() else {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid copy submission"));
    };
    let updated = store
        .update_book_instance(&id, &instance)
        .await
        .map_err(store_failure)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Book copy not found"));
    }
    Ok(Redirect::to(&url(&id)).into_response())
}

////////////////////////////////////////////// Router /////////////////////////////////////////////////

/// Creates the book instance routes backed by the given store.
pub fn create_book_instance_router(store: SharedStore) -> Router {
    Router::new()
        .route("/bookinstances", get(bookinstance_list))
        .route("/bookinstance", get(|| async { Redirect::to("/bookinstances") }))
        .route(
            "/bookinstance/create",
            get(bookinstance_create_get).post(bookinstance_create_post),
        )
        .route("/bookinstance/:id", get(bookinstance_detail))
        .route(
            "/bookinstance/:id/update",
            get(bookinstance_update_get).post(bookinstance_update_post),
        )
        .route(
            "/bookinstance/:id/delete",
            get(bookinstance_delete_get).post(bookinstance_delete_post),
        )
        .with_state(store)
}
