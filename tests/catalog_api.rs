use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;

use stacks::{
    AuthorDetailPage, AuthorFormPage, AuthorListPage, BookDeletePage, BookDetailPage,
    BookFormPage, BookInstanceDetailPage, BookInstanceFormPage, GenreDeletePage, GenreListPage,
    IndexPage, MemoryCatalogStore, create_catalog_router,
};

/// Test server over a fresh in-memory catalog.
fn setup() -> TestServer {
    let store = Arc::new(MemoryCatalogStore::new());
    TestServer::new(create_catalog_router(store)).expect("test server starts")
}

fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("location header is ascii")
        .to_string()
}

fn id_from_location(location: &str) -> String {
    location
        .rsplit('/')
        .next()
        .expect("location has a path segment")
        .to_string()
}

async fn create_author(server: &TestServer, first: &str, family: &str) -> String {
    let response = server
        .post("/author/create")
        .form(&[("first_name", first), ("family_name", family)])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    location(&response)
}

async fn create_genre(server: &TestServer, name: &str) -> String {
    let response = server.post("/genre/create").form(&[("name", name)]).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    location(&response)
}

async fn create_book(server: &TestServer, title: &str, author_id: &str, genres: &[&str]) -> String {
    let mut fields = vec![
        ("title", title.to_string()),
        ("author", author_id.to_string()),
        ("summary", format!("{} summary", title)),
        ("isbn", "9781234567897".to_string()),
    ];
    for genre in genres {
        fields.push(("genre", genre.to_string()));
    }
    let response = server.post("/book/create").form(&fields).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    location(&response)
}

#[tokio::test]
async fn author_create_redirects_to_canonical_url() {
    let server = setup();
    let location = create_author(&server, "Bram", "Stoker").await;
    assert!(location.starts_with("/author/"));
    assert_eq!(id_from_location(&location).len(), 24);

    let page: AuthorDetailPage = server.get(&location).await.json();
    assert_eq!(page.author.name, "Stoker, Bram");
    assert_eq!(page.author.url, location);
    assert!(page.author_books.is_empty());
}

#[tokio::test]
async fn author_create_trims_submitted_values() {
    let server = setup();
    let response = server
        .post("/author/create")
        .form(&[("first_name", "  Bram  "), ("family_name", " Stoker ")])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let page: AuthorDetailPage = server.get(&location(&response)).await.json();
    assert_eq!(page.author.first_name, "Bram");
    assert_eq!(page.author.family_name, "Stoker");
}

#[tokio::test]
async fn author_create_with_blank_fields_rerenders_with_one_error_each() {
    let server = setup();
    let response = server
        .post("/author/create")
        .form(&[("first_name", "   "), ("family_name", "")])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page: AuthorFormPage = response.json();
    assert_eq!(page.errors.len(), 2);
    assert_eq!(page.errors[0].field, "first_name");
    assert_eq!(page.errors[0].msg, "First name required");
    assert_eq!(page.errors[1].field, "family_name");
    assert_eq!(page.errors[1].msg, "Family name required");

    // Nothing was persisted.
    let list: AuthorListPage = server.get("/authors").await.json();
    assert!(list.author_list.is_empty());
}

#[tokio::test]
async fn author_create_rerenders_with_cleaned_values_on_date_error() {
    let server = setup();
    let response = server
        .post("/author/create")
        .form(&[
            ("first_name", " Bram "),
            ("family_name", "Stoker"),
            ("date_of_birth", "yesterday"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page: AuthorFormPage = response.json();
    let form = page.author.expect("form values echoed back");
    assert_eq!(form.first_name, "Bram");
    assert_eq!(form.date_of_birth, "yesterday");
    assert_eq!(page.errors.len(), 1);
    assert_eq!(page.errors[0].msg, "Invalid date of birth");
}

#[tokio::test]
async fn author_detail_unknown_id_is_not_found() {
    let server = setup();
    let response = server.get("/author/000000000000000000000000").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.text(), "Author not found");

    // A malformed id is indistinguishable from an absent record.
    let response = server.get("/author/not-a-real-id").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_update_preserves_identity() {
    let server = setup();
    let author_location = create_author(&server, "Bram", "Stoker").await;
    let id = id_from_location(&author_location);

    let response = server
        .post(&format!("/author/{}/update", id))
        .form(&[
            ("first_name", "Abraham"),
            ("family_name", "Stoker"),
            ("date_of_birth", "1847-11-08"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/author/{}", id));

    let page: AuthorDetailPage = server.get(&format!("/author/{}", id)).await.json();
    assert_eq!(page.author.first_name, "Abraham");
    assert_eq!(page.author.lifespan, "1847 - ");
}

#[tokio::test]
async fn author_update_form_is_prefilled() {
    let server = setup();
    let location = create_author(&server, "Bram", "Stoker").await;

    let page: AuthorFormPage = server.get(&format!("{}/update", location)).await.json();
    assert_eq!(page.title, "Update Author");
    assert_eq!(page.author.expect("prefilled").first_name, "Bram");
}

#[tokio::test]
async fn author_without_books_can_be_deleted() {
    let server = setup();
    let author_location = create_author(&server, "Bram", "Stoker").await;
    let id = id_from_location(&author_location);

    let response = server.post(&format!("/author/{}/delete", id)).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/authors");

    let response = server.get(&format!("/author/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_with_books_cannot_be_deleted() {
    let server = setup();
    let author_location = create_author(&server, "Bram", "Stoker").await;
    let author_id = id_from_location(&author_location);
    create_book(&server, "Dracula", &author_id, &[]).await;
    create_book(&server, "The Lady of the Shroud", &author_id, &[]).await;

    let response = server.post(&format!("/author/{}/delete", author_id)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let page: stacks::AuthorDeletePage = response.json();
    let titles: Vec<&str> = page.author_books.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dracula", "The Lady of the Shroud"]);

    // The author is still retrievable.
    let response = server.get(&author_location).await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn author_delete_confirmation_redirects_when_absent() {
    let server = setup();
    let response = server.get("/author/000000000000000000000000/delete").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/authors");
}

#[tokio::test]
async fn genre_duplicate_name_redirects_to_existing_record() {
    let server = setup();
    let first = create_genre(&server, "Fantasy").await;
    let second = create_genre(&server, "Fantasy").await;
    assert_eq!(first, second);

    let list: GenreListPage = server.get("/genres").await.json();
    assert_eq!(list.genres.len(), 1);
    assert_eq!(list.genres[0].name, "Fantasy");
}

#[tokio::test]
async fn genre_name_shorter_than_three_characters_is_rejected() {
    let server = setup();
    let response = server.post("/genre/create").form(&[("name", "ab")]).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page: stacks::GenreFormPage = response.json();
    assert_eq!(page.errors.len(), 1);
    assert_eq!(page.errors[0].msg, "Genre name must contain at least 3 characters");
}

#[tokio::test]
async fn genre_name_is_escaped_before_storage() {
    let server = setup();
    let location = create_genre(&server, "<Pulp>").await;
    let page: stacks::GenreDetailPage = server.get(&location).await.json();
    assert_eq!(page.genre.name, "&lt;Pulp&gt;");
}

#[tokio::test]
async fn genre_in_use_cannot_be_deleted() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let genre_location = create_genre(&server, "Gothic").await;
    let genre_id = id_from_location(&genre_location);
    create_book(&server, "Dracula", &author_id, &[&genre_id]).await;

    let response = server.post(&format!("/genre/{}/delete", genre_id)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let page: GenreDeletePage = response.json();
    assert_eq!(page.books.len(), 1);
    assert_eq!(page.books[0].title, "Dracula");

    // Delete the book, then the genre goes quietly.
    let book_id = page.books[0].id.to_string();
    let response = server.post(&format!("/book/{}/delete", book_id)).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    let response = server.post(&format!("/genre/{}/delete", genre_id)).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn book_create_with_no_genre_yields_empty_set() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let location = create_book(&server, "Dracula", &author_id, &[]).await;

    let page: BookDetailPage = server.get(&location).await.json();
    assert!(page.book.genre.is_empty());
}

#[tokio::test]
async fn book_create_with_single_genre_yields_singleton() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let genre_id = id_from_location(&create_genre(&server, "Gothic").await);
    let location = create_book(&server, "Dracula", &author_id, &[&genre_id]).await;

    let page: BookDetailPage = server.get(&location).await.json();
    assert_eq!(page.book.genre.len(), 1);
    assert_eq!(page.book.genre[0].name, "Gothic");
}

#[tokio::test]
async fn book_create_with_many_genres_yields_matching_set() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let gothic = id_from_location(&create_genre(&server, "Gothic").await);
    let horror = id_from_location(&create_genre(&server, "Horror").await);
    let location = create_book(&server, "Dracula", &author_id, &[&gothic, &horror]).await;

    let page: BookDetailPage = server.get(&location).await.json();
    let mut names: Vec<&str> = page.book.genre.iter().map(|g| g.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Gothic", "Horror"]);
}

#[tokio::test]
async fn book_form_rerender_keeps_selected_genres_checked() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let gothic = id_from_location(&create_genre(&server, "Gothic").await);
    let horror = id_from_location(&create_genre(&server, "Horror").await);

    // Blank title forces a re-render; the chosen genre must stay checked.
    let response = server
        .post("/book/create")
        .form(&[
            ("title", ""),
            ("author", author_id.as_str()),
            ("summary", "s"),
            ("isbn", "i"),
            ("genre", horror.as_str()),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page: BookFormPage = response.json();
    assert_eq!(page.errors.len(), 1);
    assert_eq!(page.errors[0].msg, "Title must not be empty.");
    let checked: Vec<bool> = page
        .genres
        .iter()
        .map(|checkbox| checkbox.checked)
        .collect();
    let gothic_pos = page.genres.iter().position(|c| c.genre.id.to_string() == gothic);
    let horror_pos = page.genres.iter().position(|c| c.genre.id.to_string() == horror);
    assert!(!checked[gothic_pos.expect("gothic listed")]);
    assert!(checked[horror_pos.expect("horror listed")]);
}

#[tokio::test]
async fn book_list_resolves_authors() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    create_book(&server, "Dracula", &author_id, &[]).await;

    let page: stacks::BookListPage = server.get("/books").await.json();
    assert_eq!(page.book_list.len(), 1);
    let author = page.book_list[0].author.as_ref().expect("author resolved");
    assert_eq!(author.name, "Stoker, Bram");
}

#[tokio::test]
async fn book_detail_renders_broken_author_reference_as_missing() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let book_location = create_book(&server, "Dracula", &author_id, &[]).await;

    // Delete the book so the author can go, then restore the book-less state
    // by recreating the book against the now-deleted author id.
    let book_id = id_from_location(&book_location);
    server.post(&format!("/book/{}/delete", book_id)).await;
    server.post(&format!("/author/{}/delete", author_id)).await;
    let book_location = create_book(&server, "Dracula", &author_id, &[]).await;

    let response = server.get(&book_location).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let page: BookDetailPage = response.json();
    assert!(page.book.author.is_none());
}

#[tokio::test]
async fn book_delete_lists_copies_but_never_blocks() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let book_location = create_book(&server, "Dracula", &author_id, &[]).await;
    let book_id = id_from_location(&book_location);

    let response = server
        .post("/bookinstance/create")
        .form(&[("book", book_id.as_str()), ("imprint", "Penguin")])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let page: BookDeletePage = server.get(&format!("/book/{}/delete", book_id)).await.json();
    assert_eq!(page.book_instances.len(), 1);

    let response = server.post(&format!("/book/{}/delete", book_id)).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books");
}

#[tokio::test]
async fn bookinstance_status_round_trips() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let book_id = id_from_location(&create_book(&server, "Dracula", &author_id, &[]).await);

    let response = server
        .post("/bookinstance/create")
        .form(&[
            ("book", book_id.as_str()),
            ("imprint", "Archibald Constable"),
            ("status", "Available"),
            ("due_back", "2026-09-01"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let page: BookInstanceDetailPage = server.get(&location(&response)).await.json();
    assert_eq!(page.bookinstance.status, stacks::LoanStatus::Available);
    assert_eq!(page.bookinstance.due_back_formatted, "Sep 1, 2026");
    assert_eq!(page.title, "Copy: Dracula");
}

#[tokio::test]
async fn bookinstance_rejects_status_outside_enum() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let book_id = id_from_location(&create_book(&server, "Dracula", &author_id, &[]).await);

    let response = server
        .post("/bookinstance/create")
        .form(&[
            ("book", book_id.as_str()),
            ("imprint", "Penguin"),
            ("status", "Lost"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page: BookInstanceFormPage = response.json();
    assert_eq!(page.errors.len(), 1);
    assert_eq!(page.errors[0].field, "status");
    assert_eq!(page.errors[0].msg, "Invalid status");

    // Nothing was persisted.
    let list: stacks::BookInstanceListPage = server.get("/bookinstances").await.json();
    assert!(list.bookinstance_list.is_empty());
}

#[tokio::test]
async fn bookinstance_defaults_status_and_due_date() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let book_id = id_from_location(&create_book(&server, "Dracula", &author_id, &[]).await);

    let response = server
        .post("/bookinstance/create")
        .form(&[("book", book_id.as_str()), ("imprint", "Penguin")])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let page: BookInstanceDetailPage = server.get(&location(&response)).await.json();
    assert_eq!(page.bookinstance.status, stacks::LoanStatus::Maintenance);
}

#[tokio::test]
async fn bookinstance_update_validation_failure_writes_nothing() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    let book_id = id_from_location(&create_book(&server, "Dracula", &author_id, &[]).await);

    let response = server
        .post("/bookinstance/create")
        .form(&[
            ("book", book_id.as_str()),
            ("imprint", "Penguin"),
            ("status", "Available"),
        ])
        .await;
    let instance_location = location(&response);
    let instance_id = id_from_location(&instance_location);

    // Submitting an empty imprint fails validation; the stored record must
    // be left exactly as it was.
    let response = server
        .post(&format!("/bookinstance/{}/update", instance_id))
        .form(&[
            ("book", book_id.as_str()),
            ("imprint", ""),
            ("status", "Loaned"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let page: BookInstanceDetailPage = server.get(&instance_location).await.json();
    assert_eq!(page.bookinstance.imprint, "Penguin");
    assert_eq!(page.bookinstance.status, stacks::LoanStatus::Available);
}

#[tokio::test]
async fn index_reports_catalog_counts() {
    let server = setup();
    let author_id = id_from_location(&create_author(&server, "Bram", "Stoker").await);
    create_genre(&server, "Gothic").await;
    let book_id = id_from_location(&create_book(&server, "Dracula", &author_id, &[]).await);
    server
        .post("/bookinstance/create")
        .form(&[
            ("book", book_id.as_str()),
            ("imprint", "Penguin"),
            ("status", "Available"),
        ])
        .await;
    server
        .post("/bookinstance/create")
        .form(&[("book", book_id.as_str()), ("imprint", "Penguin")])
        .await;

    let page: IndexPage = server.get("/").await.json();
    assert_eq!(page.title, "Local Library Home");
    assert_eq!(page.data.author_count, 1);
    assert_eq!(page.data.genre_count, 1);
    assert_eq!(page.data.book_count, 1);
    assert_eq!(page.data.book_instance_count, 2);
    assert_eq!(page.data.book_instance_available_count, 1);
}

#[tokio::test]
async fn bare_collection_paths_redirect_to_lists() {
    let server = setup();
    for (bare, list) in [
        ("/book", "/books"),
        ("/author", "/authors"),
        ("/genre", "/genres"),
        ("/bookinstance", "/bookinstances"),
    ] {
        let response = server.get(bare).await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), list);
    }
}

#[tokio::test]
async fn lists_are_sorted() {
    let server = setup();
    create_author(&server, "Patrick", "Rothfuss").await;
    create_author(&server, "Isaac", "Asimov").await;

    let page: AuthorListPage = server.get("/authors").await.json();
    let names: Vec<&str> = page
        .author_list
        .iter()
        .map(|author| author.family_name.as_str())
        .collect();
    assert_eq!(names, vec!["Asimov", "Rothfuss"]);
}
