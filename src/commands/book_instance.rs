//! # Book Instance Command Handler
//!
//! Handles CLI commands for physical copies: creation, listing, retrieval,
//! and deletion.

use crate::commands::shared::{dispatch_command, parse_record_id_or_exit, validate_args_count_or_exit};
use crate::{BookInstanceDetailPage, BookInstanceListPage, cli_utils, http_utils};

const INSTANCE_USAGE: &str = "Usage: stackctl bookinstance <create|list|get|delete> [args...]";

/// Handles all book instance commands.
pub async fn handle_book_instance_command(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    dispatch_command!("bookinstance", INSTANCE_USAGE, args, client, output_format, {
        "create" => handle_instance_create,
        "list" => handle_instance_list,
        "get" => handle_instance_get,
        "delete" => handle_instance_delete,
    });
}

async fn handle_instance_create(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        3,
        5,
        "create",
        "Usage: stackctl bookinstance create <book-id> <imprint> [status] [due-back]",
    );
    let book = parse_record_id_or_exit(&args[1]);
    let fields = [
        ("book", book.to_string()),
        ("imprint", args[2].clone()),
        ("status", args.get(3).cloned().unwrap_or_default()),
        ("due_back", args.get(4).cloned().unwrap_or_default()),
    ];

    let page = http_utils::execute_or_exit(
        || client.post_form::<BookInstanceDetailPage>("/bookinstance/create", &fields),
        "Failed to create book instance",
    )
    .await;

    println!(
        "Created copy: {} [{}] ({})",
        page.bookinstance.imprint, page.bookinstance.status, page.bookinstance.url
    );
}

async fn handle_instance_list(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 1, 1, "list", "Usage: stackctl bookinstance list");
    let page = http_utils::execute_or_exit(
        || client.get::<BookInstanceListPage>("/bookinstances"),
        "Failed to list book instances",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page.bookinstance_list, "book instances");
    } else if page.bookinstance_list.is_empty() {
        println!("No book instances found");
    } else {
        println!("Book instances:");
        for instance in &page.bookinstance_list {
            let title = instance
                .book
                .as_ref()
                .map(|book| book.title.clone())
                .unwrap_or_else(|| "(missing book)".to_string());
            println!(
                "  {} - {} [{}] due {}",
                title, instance.imprint, instance.status, instance.due_back_formatted
            );
        }
    }
}

async fn handle_instance_get(
    args: &[String],
    client: &http_utils::CatalogClient,
    output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(args, 2, 2, "get", "Usage: stackctl bookinstance get <instance-id>");
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/bookinstance/{}", id);
    let page = http_utils::execute_or_exit(
        || client.get::<BookInstanceDetailPage>(&path),
        "Failed to get book instance",
    )
    .await;

    if output_format == cli_utils::OutputFormat::Json {
        cli_utils::print_json_or_exit(&page, "book instance");
    } else {
        println!("{}", page.title);
        println!(
            "  {} [{}] due {}",
            page.bookinstance.imprint, page.bookinstance.status, page.bookinstance.due_back_formatted
        );
    }
}

async fn handle_instance_delete(
    args: &[String],
    client: &http_utils::CatalogClient,
    _output_format: cli_utils::OutputFormat,
) {
    validate_args_count_or_exit(
        args,
        2,
        2,
        "delete",
        "Usage: stackctl bookinstance delete <instance-id>",
    );
    let id = parse_record_id_or_exit(&args[1]);
    let path = format!("/bookinstance/{}/delete", id);
    http_utils::execute_or_exit(
        || client.post_empty::<BookInstanceListPage>(&path),
        "Failed to delete book instance",
    )
    .await;

    println!("Deleted book instance: {}", id);
}
