//! # Bookshelf CLI (`shelf`)
//!
//! The `shelf` binary manages the book catalog database and runs the HTTP
//! API server.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf init` | Create the SQLite database and run schema migrations |
//! | `shelf add` | Embed a description and store a book record |
//! | `shelf search "<query>"` | Search the catalog (semantic or fuzzy) |
//! | `shelf stats` | Print book and token counts |
//! | `shelf serve` | Start the HTTP API server |

mod add;
mod catalog;
mod config;
mod db;
mod embedding;
mod fuzzy;
mod migrate;
mod models;
mod search;
mod server;
mod stats;
mod tokens;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bookshelf CLI — a book catalog with semantic vector search and fuzzy
/// text search.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Bookshelf — a book catalog with semantic vector search and fuzzy text search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the books and login_tokens
    /// tables. This command is idempotent — running it multiple times is safe.
    Init,

    /// Add a book to the catalog.
    ///
    /// Embeds the description with the configured provider and stores the
    /// record. Requires `[embedding]` to be configured.
    Add {
        /// Book title.
        name: String,

        /// Author name.
        author: String,

        /// Price (non-negative).
        price: f64,

        /// Description text; this is what gets embedded and searched.
        description: String,

        /// Number of copies sold.
        #[arg(long)]
        copies_sold: Option<i64>,
    },

    /// Search the catalog.
    Search {
        /// The search query string.
        query: String,

        /// Search mode: `semantic` (vector similarity) or `fuzzy`
        /// (typo-tolerant text match).
        #[arg(long, default_value = "fuzzy")]
        mode: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Print database statistics.
    Stats,

    /// Start the HTTP API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// book and login-token endpoints. Also runs the token TTL sweeper.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookshelf=info,shelf=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Add {
            name,
            author,
            price,
            description,
            copies_sold,
        } => {
            add::run_add(&cfg, &name, &author, price, &description, copies_sold).await?;
        }
        Commands::Search { query, mode, limit } => {
            search::run_search(&cfg, &query, &mode, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
