//! # Author Command Handler
//!
//! Handles author-related CLI commands: creation, listing, retrieval, and
//! deletion.

use crate::commands::shared::{dispatch_command, parse_record_id_or_exit, validate_args_count_or_exit};
use crate::{AuthorDetailPage, AuthorListPage, cli_utils, http_utils};

const AUTHOR_USAGE: &str = "Usage: stackctl author <create|list|get|delete> [args...]";

/// Handles all author-related commands.
pub async fn handle_author_command(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("author", AUTHOR_USAGE, args, client, output_format, {
        "create" => handle_author_create,
        "list" => handle_author_list,
        "get" => handle_author_get,
        "delete" => handle_author_delete,
    });
}

async fn handle_author_create(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        5,
        "create",
        "Usage: stackctl author create <first-name> <family-name> [date-of-birth] [date-of-death]",
    );
    let fields = [
        ("first_name", args[1].clone()),
        ("family_name", args[2].clone()),
        ("date_of_birth", args.get(3).cloned().unwrap_or_default()),
        ("date_of_death", args.get(4).cloned().unwrap_or_default()),
    ];

    let page = http_utils::execute_or_exit(
        || client.post_form::<AuthorDetailPage>("/author/create", &fields),
        "Failed to create author",
    )
    .await;

    println!("Created author: {} ({})", page.author.name, page.author.url);
}

async fn handle_author_list(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "list", "Usage: stackctl author list");
    let page = http_utils::execute_or_exit(
        || client.get::<AuthorListPage>("/authors"),
        "Failed to list authors",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page.author_list, "authors");
    } else if page.author_list.is_empty() {
        println!("No authors found");
    } else {
        println!("Authors:");
        for author in &page.author_list {
            println!("  {} ({}) {}", author.name, author.lifespan, author.url);
        }
    }
}

async fn handle_author_get(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "get", "Usage: stackctl author get <author-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/author/{}", id);
    let page = http_utils::execute_or_exit(
        || client.get::<AuthorDetailPage>(&path),
        "Failed to get author",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page, "author");
    } else {
        println!("{} ({})", page.author.name, page.author.lifespan);
        for book in &page.author_books {
            println!("  {} {}", book.title, book.url);
        }
    }
}

async fn handle_author_delete(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "delete", "Usage: stackctl author delete <author-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/author/{}/delete", id);
    http_utils::execute_or_exit(
        || client.post_empty::<AuthorListPage>(&path),
        "Failed to delete author",
    )
    .await;

    println!("Deleted author: {}", id);
}
