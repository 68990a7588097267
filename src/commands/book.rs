//! # Book Command Handler
//!
//! Handles book-related CLI commands: creation, listing, retrieval, and
//! deletion.

use crate::commands::shared::{dispatch_command, parse_record_id_or_exit, validate_args_count_or_exit};
use crate::{BookDetailPage, BookListPage, cli_utils, http_utils};

const BOOK_USAGE: &str = "Usage: stackctl book <create|list|get|delete> [args...]";

/// Handles all book-related commands.
pub async fn handle_book_command(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("book", BOOK_USAGE, args, client, output_format, {
        "create" => handle_book_create,
        "list" => handle_book_list,
        "get" => handle_book_get,
        "delete" => handle_book_delete,
    });
}

async fn handle_book_create(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        5,
        usize::MAX,
        "create",
        "Usage: stackctl book create <title> <author-id> <summary> <isbn> [genre-id...]",
    );
    let author = parse_record_id_or_exit(&args[2]);

    let mut fields = vec![
        ("title", args[1].clone()),
        ("author", author.to_string()),
        ("summary", args[3].clone()),
        ("isbn", args[4].clone()),
    ];
    for genre_arg in &args[5..] {
        let genre = parse_record_id_or_exit(genre_arg);
        fields.push(("genre", genre.to_string()));
    }

    let page = http_utils::execute_or_exit(
        || client.post_form::<BookDetailPage>("/book/create", &fields),
        "Failed to create book",
    )
    .await;

    println!("Created book: {} ({})", page.book.title, page.book.url);
}

async fn handle_book_list(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "list", "Usage: stackctl book list");
    let page = http_utils::execute_or_exit(
        || client.get::<BookListPage>("/books"),
        "Failed to list books",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page.book_list, "books");
    } else if page.book_list.is_empty() {
        println!("No books found");
    } else {
        println!("Books:");
        for book in &page.book_list {
            let author = book
                .author
                .as_ref()
                .map(|author| author.name.clone())
                .unwrap_or_else(|| "(unknown author)".to_string());
            println!("  {} by {} {}", book.title, author, book.url);
        }
    }
}

async fn handle_book_get(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "get", "Usage: stackctl book get <book-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/book/{}", id);
    let page = http_utils::execute_or_exit(
        || client.get::<BookDetailPage>(&path),
        "Failed to get book",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page, "book");
    } else {
        println!("{} (ISBN {})", page.book.title, page.book.isbn);
        println!("  {}", page.book.summary);
        for instance in &page.book_instances {
            println!("  copy: {} [{}] {}", instance.imprint, instance.status, instance.url);
        }
    }
}

async fn handle_book_delete(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "delete", "Usage: stackctl book delete <book-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/book/{}/delete", id);
    http_utils::execute_or_exit(
        || client.post_empty::<BookListPage>(&path),
        "Failed to delete book",
    )
    .await;

    println!("Deleted book: {}", id);
}
