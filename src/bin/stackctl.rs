use arrrg::CommandLine;
use arrrg_derive::CommandLine;

use stacks::{
    cli_utils::{self, OutputFormat},
    commands::{
        handle_author_command, handle_book_command, handle_book_instance_command,
        handle_genre_command,
    },
    http_utils,
};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Options {
    #[arrrg(optional, "Base URL of the catalog daemon")]
    base_url: String,
    #[arrrg(optional, "Output format for get/list commands: text or json (default: text)")]
    output: String,
}

const USAGE: &str = r#"Usage: stackctl [options] <command> [args...]

Options:
  --base-url <url>     Base URL of the catalog daemon (default: http://localhost:8080)
  --output <format>    Output format for get/list commands: text or json (default: text)

Commands:
  author create <first> <family> [born] [died]      Create an author
  author list                                       List all authors
  author get <author-id>                            Get an author and their books
  author delete <author-id>                         Delete an author (blocked while books reference it)
  genre create <name>                               Create a genre (or find the existing one by name)
  genre list                                        List all genres
  genre get <genre-id>                              Get a genre and its books
  genre delete <genre-id>                           Delete a genre (blocked while books reference it)
  book create <title> <author-id> <summary> <isbn> [genre-id...]
                                                    Create a book
  book list                                         List all books
  book get <book-id>                                Get a book and its copies
  book delete <book-id>                             Delete a book
  bookinstance create <book-id> <imprint> [status] [due-back]
                                                    Create a physical copy
  bookinstance list                                 List all copies
  bookinstance get <instance-id>                    Get a copy
  bookinstance delete <instance-id>                 Delete a copy"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (options, free) = Options::from_command_line_relaxed("USAGE: stackctl <command> [args...]");

    if free.is_empty() {
        cli_utils::exit_with_usage_error("No command specified", USAGE);
    }

    let base_url = if options.base_url.is_empty() {
        "http://localhost:8080".to_string()
    } else {
        options.base_url
    };
    let output_format: OutputFormat = options
        .output
        .parse()
        .unwrap_or_else(|e: String| cli_utils::exit_with_error(&e));

    let client = http_utils::CatalogClient::new(base_url);

    match free[0].as_str() {
        "author" => {
            handle_author_command(&free[1..], &client, output_format).await;
        }
        "genre" => {
            handle_genre_command(&free[1..], &client, output_format).await;
        }
        "book" => {
            handle_book_command(&free[1..], &client, output_format).await;
        }
        "bookinstance" => {
            handle_book_instance_command(&free[1..], &client, output_format).await;
        }
        "help" => {
            println!("{}", USAGE);
        }
        _ => {
            cli_utils::exit_with_usage_error(&format!("Unknown command '{}'", free[0]), USAGE);
        }
    }

    Ok(())
}
