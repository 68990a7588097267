use axum::extract::{Path, RawForm, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::book::BookSummary;
use crate::dates::{format_optional_date, parse_iso_date};
use crate::forms::{FieldError, FormErrors, FormFields, clean};
use crate::integrity;
use crate::record_id::parse_path_id;
use crate::store::{SharedStore, store_failure};
use crate::RecordId;

//////////////////////////////////////////////// Author ///////////////////////////////////////////////

/// Stored fields of an author record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Given name, trimmed and escaped at validation time.
    pub first_name: String,
    /// Family name; authors list in family-name order.
    pub family_name: String,
    /// Date of birth, if known.
    pub date_of_birth: Option<NaiveDate>,
    /// Date of death, if known.
    pub date_of_death: Option<NaiveDate>,
}

/// An author together with its store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// The record identity.
    pub id: RecordId,
    /// The stored fields.
    #[serde(flatten)]
    pub author: Author,
}

///////////////////////////////////////// Computed Fields /////////////////////////////////////////////

/// Derives an author's display name, "family_name, first_name".
///
/// Either part being empty yields the empty string.
pub fn full_name(author: &Author) -> String {
    if author.first_name.is_empty() || author.family_name.is_empty() {
        return String::new();
    }
    format!("{}, {}", author.family_name, author.first_name)
}

/// Derives an author's lifespan, "birthYear - deathYear".
///
/// Unknown years render as empty on their side of the dash.
pub fn lifespan(author: &Author) -> String {
    let birth = author
        .date_of_birth
        .map(|date| date.year().to_string())
        .unwrap_or_default();
    let death = author
        .date_of_death
        .map(|date| date.year().to_string())
        .unwrap_or_default();
    format!("{} - {}", birth, death)
}

/// Canonical resource path for an author record.
pub fn url(id: &RecordId) -> String {
    format!("/author/{}", id)
}

/// The author data object handed to the view renderer. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorView {
    /// The record identity.
    pub id: RecordId,
    /// Stored given name.
    pub first_name: String,
    /// Stored family name.
    pub family_name: String,
    /// Stored date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Stored date of death.
    pub date_of_death: Option<NaiveDate>,
    /// Computed display name.
    pub name: String,
    /// Computed lifespan string.
    pub lifespan: String,
    /// Date of birth formatted for display, empty when unknown.
    pub date_of_birth_formatted: String,
    /// Date of death formatted for display, empty when unknown.
    pub date_of_death_formatted: String,
    /// Canonical resource path.
    pub url: String,
}

impl AuthorView {
    /// Assembles the view for one stored record.
    pub fn from_record(record: &AuthorRecord) -> AuthorView {
        AuthorView {
            id: record.id,
            first_name: record.author.first_name.clone(),
            family_name: record.author.family_name.clone(),
            date_of_birth: record.author.date_of_birth,
            date_of_death: record.author.date_of_death,
            name: full_name(&record.author),
            lifespan: lifespan(&record.author),
            date_of_birth_formatted: format_optional_date(record.author.date_of_birth),
            date_of_death_formatted: format_optional_date(record.author.date_of_death),
            url: url(&record.id),
        }
    }
}

//////////////////////////////////////////////// Form /////////////////////////////////////////////////

/// Cleaned values of a submitted author form.
///
/// Dates stay in their submitted ISO text form so the form can re-render
/// exactly what the user typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorForm {
    /// Trimmed and escaped given name.
    pub first_name: String,
    /// Trimmed and escaped family name.
    pub family_name: String,
    /// Submitted date of birth text.
    pub date_of_birth: String,
    /// Submitted date of death text.
    pub date_of_death: String,
}

impl AuthorForm {
    /// Applies the author rule table to one submission.
    ///
    /// Always returns the cleaned values; the error list is empty when every
    /// rule passed.
    pub fn validate(fields: &FormFields) -> (AuthorForm, Vec<FieldError>) {
        let mut errors = FormErrors::new();

        let first_name = clean(fields.first("first_name").unwrap_or(""));
        if errors.required("first_name", &first_name, "First name required") {
            if errors.max_length(
                "first_name",
                &first_name,
                100,
                "First name must not exceed 100 characters",
            ) {
                errors.alphanumeric(
                    "first_name",
                    &first_name,
                    "First name has non-alphanumeric characters",
                );
            }
        }

        let family_name = clean(fields.first("family_name").unwrap_or(""));
        if errors.required("family_name", &family_name, "Family name required") {
            if errors.max_length(
                "family_name",
                &family_name,
                100,
                "Family name must not exceed 100 characters",
            ) {
                errors.alphanumeric(
                    "family_name",
                    &family_name,
                    "Family name has non-alphanumeric characters",
                );
            }
        }

        let date_of_birth = fields.first("date_of_birth").unwrap_or("").trim().to_string();
        errors.optional_date("date_of_birth", &date_of_birth, "Invalid date of birth");

        let date_of_death = fields.first("date_of_death").unwrap_or("").trim().to_string();
        errors.optional_date("date_of_death", &date_of_death, "Invalid date of death");

        let form = AuthorForm {
            first_name,
            family_name,
            date_of_birth,
            date_of_death,
        };
        (form, errors.into_vec())
    }

    /// Pre-fills the form from a stored record for the update page.
    pub fn from_record(record: &AuthorRecord) -> AuthorForm {
        AuthorForm {
            first_name: record.author.first_name.clone(),
            family_name: record.author.family_name.clone(),
            date_of_birth: record
                .author
                .date_of_birth
                .map(|date| date.to_string())
                .unwrap_or_default(),
            date_of_death: record
                .author
                .date_of_death
                .map(|date| date.to_string())
                .unwrap_or_default(),
        }
    }

    /// Converts a validated form into the stored payload.
    pub fn into_author(self) -> Author {
        Author {
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: parse_iso_date(&self.date_of_birth),
            date_of_death: parse_iso_date(&self.date_of_death),
        }
    }
}

////////////////////////////////////////////// Routes /////////////////////////////////////////////////

/// Page object for the author list.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorListPage {
    /// Page title.
    pub title: String,
    /// All authors, in family-name order.
    pub author_list: Vec<AuthorView>,
}

/// Page object for an author's detail view.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorDetailPage {
    /// Page title.
    pub title: String,
    /// The author on display.
    pub author: AuthorView,
    /// Books referencing this author.
    pub author_books: Vec<BookSummary>,
}

/// Page object for the author create/update form.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorFormPage {
    /// Page title.
    pub title: String,
    /// Values to pre-fill, absent on a fresh create form.
    pub author: Option<AuthorForm>,
    /// Field-level validation errors from the last submission.
    pub errors: Vec<FieldError>,
}

/// Page object for the author delete confirmation.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorDeletePage {
    /// Page title.
    pub title: String,
    /// The author staged for deletion.
    pub author: Option<AuthorView>,
    /// Books blocking the deletion; deletion proceeds only when empty.
    pub author_books: Vec<BookSummary>,
}

async fn author_list(
    State(store): State<SharedStore>,
) -> Result<Json<AuthorListPage>, (StatusCode, &'static str)> {
    let authors = store.list_authors().await.map_err(store_failure)?;
    Ok(Json(AuthorListPage {
        title: "Author List".to_string(),
        author_list: authors.iter().map(AuthorView::from_record).collect(),
    }))
}

async fn author_detail(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<AuthorDetailPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Author not found")?;
    let (author, books) = tokio::join!(store.get_author(&id), store.find_books_by_author(&id));
    let author = author
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Author not found"))?;
    let books = books.map_err(store_failure)?;
    Ok(Json(AuthorDetailPage {
        title: "Author Detail".to_string(),
        author: AuthorView::from_record(&author),
        author_books: books.iter().map(BookSummary::from_record).collect(),
    }))
}

async fn author_create_get() -> Json<AuthorFormPage> {
    Json(AuthorFormPage {
        title: "Create Author".to_string(),
        author: None,
        errors: Vec::new(),
    })
}

async fn author_create_post(
    State(store): State<SharedStore>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let fields = FormFields::parse(&body);
    let (form, errors) = AuthorForm::validate(&fields);

    if !errors.is_empty() {
        let page = AuthorFormPage {
            title: "Create Author".to_string(),
            author: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let id = store
        .insert_author(&form.into_author())
        .await
        .map_err(store_failure)?;
    Ok(Redirect::to(&url(&id)).into_response())
}

async fn author_delete_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Author not found")?;
    let (author, books) = tokio::join!(store.get_author(&id), store.find_books_by_author(&id));
    let author = author.map_err(store_failure)?;
    let books = books.map_err(store_failure)?;

    // Nothing to confirm for an id that no longer resolves.
    let Some(author) = author else {
        return Ok(Redirect::to("/authors").into_response());
    };

    let page = AuthorDeletePage {
        title: "Delete Author".to_string(),
        author: Some(AuthorView::from_record(&author)),
        author_books: books.iter().map(BookSummary::from_record).collect(),
    };
    Ok(Json(page).into_response())
}

async fn author_delete_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Author not found")?;
    let check = integrity::check_author_delete(store.as_ref(), &id)
        .await
        .map_err(store_failure)?;

    if !check.allowed {
        let author = store.get_author(&id).await.map_err(store_failure)?;
        let page = AuthorDeletePage {
            title: "Delete Author".to_string(),
            author: author.as_ref().map(AuthorView::from_record),
            author_books: check.blockers.iter().map(BookSummary::from_record).collect(),
        };
        return Ok((StatusCode::CONFLICT, Json(page)).into_response());
    }

    store.delete_author(&id).await.map_err(store_failure)?;
    Ok(Redirect::to("/authors").into_response())
}

async fn author_update_get(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<AuthorFormPage>, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Author not found")?;
    let author = store
        .get_author(&id)
        .await
        .map_err(store_failure)?
        .ok_or((StatusCode::NOT_FOUND, "Author not found"))?;
    Ok(Json(AuthorFormPage {
        title: "Update Author".to_string(),
        author: Some(AuthorForm::from_record(&author)),
        errors: Vec::new(),
    }))
}

async fn author_update_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    RawForm(body): RawForm,
) -> Result<Response, (StatusCode, &'static str)> {
    let id = parse_path_id(&id, "Author not found")?;
    let fields = FormFields::parse(&body);
    let (form, errors) = AuthorForm::validate(&fields);

    if !errors.is_empty() {
        let page = AuthorFormPage {
            title: "Update Author".to_string(),
            author: Some(form),
            errors,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(page)).into_response());
    }

    let updated = store
        .update_author(&id, &form.into_author())
        .await
        .map_err(store_failure)?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "Author not found"));
    }
    Ok(Redirect::to(&url(&id)).into_response())
}

////////////////////////////////////////////// Router /////////////////////////////////////////////////

/// Creates the author routes backed by the given store.
pub fn create_author_router(store: SharedStore) -> Router {
    Router::new()
        .route("/authors", get(author_list))
        .route("/author", get(|| async { Redirect::to("/authors") }))
        .route("/author/create", get(author_create_get).post(author_create_post))
        .route("/author/:id", get(author_detail))
        .route(
            "/author/:id/update",
            get(author_update_get).post(author_update_post),
        )
        .route(
            "/author/:id/delete",
            get(author_delete_get).post(author_delete_post),
        )
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stoker() -> Author {
        Author {
            first_name: "Bram".to_string(),
            family_name: "Stoker".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1847, 11, 8),
            date_of_death: NaiveDate::from_ymd_opt(1912, 4, 20),
        }
    }

    #[test]
    fn full_name_joins_family_first() {
        assert_eq!(full_name(&stoker()), "Stoker, Bram");
    }

    #[test]
    fn full_name_empty_when_part_missing() {
        let mut author = stoker();
        author.first_name = String::new();
        assert_eq!(full_name(&author), "");
    }

    #[test]
    fn lifespan_uses_full_years() {
        assert_eq!(lifespan(&stoker()), "1847 - 1912");

        let mut living = stoker();
        living.date_of_death = None;
        assert_eq!(lifespan(&living), "1847 - ");

        let mut unknown = stoker();
        unknown.date_of_birth = None;
        unknown.date_of_death = None;
        assert_eq!(lifespan(&unknown), " - ");
    }

    #[test]
    fn url_is_canonical_path() {
        let id = RecordId::new([1u8; 12]);
        assert_eq!(url(&id), format!("/author/{}", id));
    }

    #[test]
    fn view_carries_computed_fields() {
        let record = AuthorRecord {
            id: RecordId::new([1u8; 12]),
            author: stoker(),
        };
        let view = AuthorView::from_record(&record);
        assert_eq!(view.name, "Stoker, Bram");
        assert_eq!(view.lifespan, "1847 - 1912");
        assert_eq!(view.date_of_birth_formatted, "Nov 8, 1847");
        assert_eq!(view.url, format!("/author/{}", record.id));
    }

    #[test]
    fn validate_accepts_clean_submission() {
        let fields =
            FormFields::parse(b"first_name=Bram&family_name=Stoker&date_of_birth=1847-11-08&date_of_death=");
        let (form, errors) = AuthorForm::validate(&fields);
        assert!(errors.is_empty());
        assert_eq!(form.first_name, "Bram");

        let author = form.into_author();
        assert_eq!(author.date_of_birth, NaiveDate::from_ymd_opt(1847, 11, 8));
        assert_eq!(author.date_of_death, None);
    }

    #[test]
    fn validate_trims_whitespace() {
        let fields = FormFields::parse(b"first_name=%20Bram%20&family_name=Stoker");
        let (form, errors) = AuthorForm::validate(&fields);
        assert!(errors.is_empty());
        assert_eq!(form.first_name, "Bram");
    }

    #[test]
    fn validate_flags_missing_names_once_each() {
        let fields = FormFields::parse(b"first_name=%20%20&family_name=");
        let (_, errors) = AuthorForm::validate(&fields);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "first_name");
        assert_eq!(errors[0].msg, "First name required");
        assert_eq!(errors[1].field, "family_name");
        assert_eq!(errors[1].msg, "Family name required");
    }

    #[test]
    fn validate_rejects_non_alphanumeric_names() {
        let fields = FormFields::parse(b"first_name=Bram!&family_name=Stoker");
        let (_, errors) = AuthorForm::validate(&fields);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].msg, "First name has non-alphanumeric characters");
    }

    #[test]
    fn validate_rejects_bad_dates_but_keeps_text() {
        let fields =
            FormFields::parse(b"first_name=Bram&family_name=Stoker&date_of_birth=eighteen47");
        let (form, errors) = AuthorForm::validate(&fields);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "date_of_birth");
        assert_eq!(errors[0].msg, "Invalid date of birth");
        assert_eq!(form.date_of_birth, "eighteen47");
    }

    #[test]
    fn form_round_trips_through_record() {
        let record = AuthorRecord {
            id: RecordId::new([1u8; 12]),
            author: stoker(),
        };
        let form = AuthorForm::from_record(&record);
        assert_eq!(form.date_of_birth, "1847-11-08");
        assert_eq!(form.into_author(), record.author);
    }
}
