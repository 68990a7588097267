use std::sync::Arc;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;

use stacks::{CatalogStore, MemoryCatalogStore, PgCatalogStore, create_catalog_router};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "PostgreSQL URL; omit to keep the catalog in memory")]
    database_url: Option<String>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const HELP_TEXT: &str = r#"stacksd - Library catalog daemon

USAGE:
    stacksd [OPTIONS]

OPTIONS:
    --host <HOST>            Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>            Port to bind the HTTP server [default: 8080]
    --database-url <URL>     PostgreSQL URL; omit to keep the catalog in memory
    --verbose                Enable verbose logging

DESCRIPTION:
    Serves the library catalog: authors, books, genres, and physical copies,
    with form-based create/update/delete flows and referential-integrity
    checks on deletion.

    The server supports graceful shutdown via SIGTERM or Ctrl+C.

ROUTES:
    GET  /                           Catalog home (record counts)

    GET  /books                      Book list
    GET  /book/create                Book create form
    POST /book/create                Create a book
    GET  /book/{id}                  Book detail
    GET  /book/{id}/update           Book update form
    POST /book/{id}/update           Update a book
    GET  /book/{id}/delete           Book delete confirmation
    POST /book/{id}/delete           Delete a book

    ...and the same eight routes for /author(s), /genre(s), and
    /bookinstance(s)."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: stacksd [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let config = ServerConfig::from_args(args);

    if config.verbose {
        println!("stacksd starting with configuration:");
        println!("  Bind address: {}:{}", config.host, config.port);
        match &config.database_url {
            Some(url) => println!("  Store: postgresql ({})", url),
            None => println!("  Store: in-memory"),
        }
    }

    // Pick the store backend; the router is indifferent to the choice.
    let store: Arc<dyn CatalogStore> = match &config.database_url {
        Some(url) => {
            let store = PgCatalogStore::connect(url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => Arc::new(MemoryCatalogStore::new()),
    };

    let app = create_catalog_router(store);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("📚 stacks catalog daemon started");
    println!("📡 Server listening on: http://{}", addr);
    println!("💡 Use Ctrl+C or send SIGTERM for graceful shutdown");
    println!();

    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                eprintln!("❌ Server error: {}", e);
                std::process::exit(1);
            }
        }
        () = shutdown_signal => {
            println!();
            println!("🛑 Shutdown signal received, stopping server gracefully...");
            println!("👋 stacksd stopped");
        }
    }

    Ok(())
}

struct ServerConfig {
    host: String,
    port: u16,
    database_url: Option<String>,
    verbose: bool,
}

impl ServerConfig {
    fn from_args(args: Args) -> Self {
        Self {
            host: args.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: args.port.unwrap_or(8080),
            database_url: args.database_url,
            verbose: args.verbose,
        }
    }
}
