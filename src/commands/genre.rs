//! # Genre Command Handler
//!
//! Handles genre-related CLI commands: creation, listing, retrieval, and
//! deletion.

use crate::commands::shared::{dispatch_command, parse_record_id_or_exit, validate_args_count_or_exit};
use crate::{GenreDetailPage, GenreListPage, cli_utils, http_utils};

const GENRE_USAGE: &str = "Usage: stackctl genre <create|list|get|delete> [args...]";

/// Handles all genre-related commands.
pub async fn handle_genre_command(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("genre", GENRE_USAGE, args, client, output_format, {
        "create" => handle_genre_create,
        "list" => handle_genre_list,
        "get" => handle_genre_get,
        "delete" => handle_genre_delete,
    });
}

async fn handle_genre_create(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "create", "Usage: stackctl genre create <name>");
    let fields = [("name", args[1].clone())];

    // A duplicate name redirects to the existing genre, so this prints the
    // record the daemon settled on either way.
    let page = http_utils::execute_or_exit(
        || client.post_form::<GenreDetailPage>("/genre/create", &fields),
        "Failed to create genre",
    )
    .await;

    println!("Genre: {} ({})", page.genre.name, page.genre.url);
}

async fn handle_genre_list(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "list", "Usage: stackctl genre list");
    let page = http_utils::execute_or_exit(
        || client.get::<GenreListPage>("/genres"),
        "Failed to list genres",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page.genres, "genres");
    } else if page.genres.is_empty() {
        println!("No genres found");
    } else {
        println!("Genres:");
        for genre in &page.genres {
            println!("  {} {}", genre.name, genre.url);
        }
    }
}

async fn handle_genre_get(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "get", "Usage: stackctl genre get <genre-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/genre/{}", id);
    let page = http_utils::execute_or_exit(
        || client.get::<GenreDetailPage>(&path),
        "Failed to get genre",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page, "genre");
    } else {
        println!("{}", page.genre.name);
        for book in &page.genre_books {
            println!("  {} {}", book.title, book.url);
        }
    }
}

async fn handle_genre_delete(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "delete", "Usage: stackctl genre delete <genre-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/genre/{}/delete", id);
    http_utils::execute_or_exit(
        || client.post_empty::<GenreListPage>(&path),
        "Failed to delete genre",
    )
    .await;

    println!("Deleted genre: {}", id);
}
