//! KVShare CLI
//!
//! Command-line access to a KVShare store directory.
//!
//! # Commands
//!
//! - `put` - Store a string value under a string key
//! - `get` - Print the value stored under a key
//! - `delete` - Remove a key
//! - `inspect` - Display the store's files and sizes

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// KVShare command-line store tools.
#[derive(Parser)]
#[command(name = "kvshare")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Fail instead of creating a missing store directory
    #[arg(global = true, long)]
    no_create: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value under a key
    Put {
        /// Key to write
        key: String,
        /// Value to store
        value: String,
    },

    /// Print the value stored under a key
    Get {
        /// Key to read
        key: String,
    },

    /// Remove a key
    Delete {
        /// Key to remove
        key: String,
    },

    /// Display store files and sizes
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let auto_create = !cli.no_create;

    match cli.command {
        Commands::Put { key, value } => {
            let path = cli.path.ok_or("Store path required for put")?;
            commands::put::run(&path, auto_create, &key, &value)?;
        }
        Commands::Get { key } => {
            let path = cli.path.ok_or("Store path required for get")?;
            commands::get::run(&path, auto_create, &key)?;
        }
        Commands::Delete { key } => {
            let path = cli.path.ok_or("Store path required for delete")?;
            commands::delete::run(&path, auto_create, &key)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Version => {
            println!("KVShare CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("KVShare Core v{}", kvshare_core::VERSION);
        }
    }

    Ok(())
}
