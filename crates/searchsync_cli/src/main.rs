//! SearchSync CLI
//!
//! Command-line tools for checking datasets and exercising the index
//! synchronization core against the in-memory full-text engine.
//!
//! # Commands
//!
//! - `rebuild` - Rebuild the index of one type, or of every type
//! - `search` - Index a dataset and query one type
//! - `identity` - Encode or decode document identities
//! - `check` - Validate a dataset file

mod commands;
mod dataset;
mod error;

use clap::{Parser, Subcommand};
use commands::search::Match;
use dataset::Dataset;
use searchsync_core::{IdentityScheme, MissingRecordPolicy, SyncConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SearchSync command-line tools.
#[derive(Parser)]
#[command(name = "searchsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the dataset file
    #[arg(global = true, short, long)]
    data: Option<PathBuf>,

    /// Use length-prefixed document identities
    #[arg(global = true, long)]
    length_prefixed: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the index of a type
    Rebuild {
        /// Type to rebuild (all types if omitted)
        type_name: Option<String>,

        /// Fail instead of skipping records that vanish mid-rebuild
        #[arg(long)]
        strict: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Index the dataset and search one type
    Search {
        /// Type to search
        type_name: String,

        /// Query text
        query: String,

        /// Match documents containing any query token
        #[arg(long, conflicts_with = "prefix")]
        any: bool,

        /// Treat the query as a token prefix
        #[arg(long)]
        prefix: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Encode or decode document identities
    Identity {
        #[command(subcommand)]
        command: IdentityCommands,
    },

    /// Validate the dataset
    Check,

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum IdentityCommands {
    /// Encode a type and key
    Encode {
        /// Record type
        type_name: String,
        /// Record key
        key: String,
    },

    /// Decode a document identity
    Decode {
        /// Document identity
        identity: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = SyncConfig::new();
    if cli.length_prefixed {
        config = config.with_identity(IdentityScheme::LengthPrefixed);
    }

    match cli.command {
        Commands::Rebuild {
            type_name,
            strict,
            format,
        } => {
            let path = cli.data.ok_or("Dataset path required for rebuild")?;
            let dataset = Dataset::load(&path)?;
            if strict {
                config = config.with_missing_records(MissingRecordPolicy::Abort);
            }
            let format = commands::parse_format(&format)?;
            commands::rebuild::run(&dataset, config, type_name.as_deref(), format)?;
        }
        Commands::Search {
            type_name,
            query,
            any,
            prefix,
            format,
        } => {
            let path = cli.data.ok_or("Dataset path required for search")?;
            let dataset = Dataset::load(&path)?;
            let mode = match (any, prefix) {
                (true, _) => Match::Any,
                (_, true) => Match::Prefix,
                _ => Match::All,
            };
            let format = commands::parse_format(&format)?;
            commands::search::run(&dataset, config, &type_name, &query, mode, format)?;
        }
        Commands::Identity { command } => match command {
            IdentityCommands::Encode { type_name, key } => {
                commands::identity::run_encode(&config, &type_name, &key)?;
            }
            IdentityCommands::Decode { identity, format } => {
                let format = commands::parse_format(&format)?;
                commands::identity::run_decode(&config, &identity, format)?;
            }
        },
        Commands::Check => {
            let path = cli.data.ok_or("Dataset path required for check")?;
            let dataset = Dataset::load(&path)?;
            commands::check::run(&dataset, &config)?;
        }
        Commands::Version => {
            println!("SearchSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SearchSync Core v{}", searchsync_core::VERSION);
        }
    }

    Ok(())
}
