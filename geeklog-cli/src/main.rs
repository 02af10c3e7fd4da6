//! # geeklog CLI
//!
//! Command-line interface for geeklog document sites.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "geeklog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "geeklog.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new geeklog site
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Render a document by name
    Show {
        /// Requested document name
        name: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = ShowFormat::Html)]
        format: ShowFormat,
    },

    /// List every document with its metadata
    List {
        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,
    },

    /// Filter and sort documents
    Search {
        /// Query parameters as key=value (e.g. tag=rust sort=timestamp reverse)
        params: Vec<String>,

        /// Return JSON for machine consumption
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum ShowFormat {
    /// Rendered page body
    Html,
    /// Full document as JSON
    Json,
    /// Metadata only, as JSON
    Meta,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_site(path.as_deref()),
        Commands::Show { name, format } => commands::show_document(&cli.config, &name, format),
        Commands::List { json } => commands::list_documents(&cli.config, json),
        Commands::Search { params, json } => commands::search_documents(&cli.config, &params, json),
    }
}
