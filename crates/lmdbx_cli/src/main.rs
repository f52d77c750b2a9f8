//! lmdbx CLI
//!
//! Command-line tools for the lmdbx client.
//!
//! # Commands
//!
//! - `resolve` - Show platform detection and which artifact loads
//! - `smoke` - Put, get, delete and close against a database
//! - `perf` - Time random puts and gets
//! - `range-demo` - Seed a database and run a set of range scans
//! - `get` / `put` / `delete` / `scan` - Single operations

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// lmdbx command-line tools.
#[derive(Parser)]
#[command(name = "lmdbx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Use the in-memory engine instead of loading the native library
    #[arg(global = true, short, long)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show platform detection, candidate order and the artifact that loads
    Resolve,

    /// Run a put/get/delete/close sequence
    Smoke {
        /// Database path
        #[arg(default_value = "test.db")]
        db: PathBuf,
    },

    /// Time random puts followed by gets
    Perf {
        /// Database path
        #[arg(default_value = "perf.db")]
        db: PathBuf,

        /// Number of keys
        #[arg(short, long, default_value = "1000")]
        count: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Seed a database and print a series of range scans
    RangeDemo {
        /// Database path
        #[arg(default_value = "range-test.db")]
        db: PathBuf,
    },

    /// Look up a key
    Get {
        /// Database path
        db: PathBuf,
        /// Key
        key: String,
    },

    /// Store a value
    Put {
        /// Database path
        db: PathBuf,
        /// Key
        key: String,
        /// Value
        value: String,
    },

    /// Remove a key
    Delete {
        /// Database path
        db: PathBuf,
        /// Key
        key: String,
    },

    /// Scan a key range
    Scan {
        /// Database path
        db: PathBuf,

        /// Inclusive lower bound
        #[arg(short, long)]
        start: Option<String>,

        /// Inclusive upper bound
        #[arg(short, long)]
        end: Option<String>,

        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Walk in descending key order
        #[arg(short, long)]
        reverse: bool,

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

    let engine = commands::EngineChoice::from_flag(cli.memory);

    match cli.command {
        Commands::Resolve => commands::resolve::run()?,
        Commands::Smoke { db } => commands::smoke::run(&engine, &db)?,
        Commands::Perf { db, count, format } => {
            commands::perf::run(&engine, &db, count, &format)?;
        }
        Commands::RangeDemo { db } => commands::range_demo::run(&engine, &db)?,
        Commands::Get { db, key } => commands::ops::get(&engine, &db, &key)?,
        Commands::Put { db, key, value } => commands::ops::put(&engine, &db, &key, &value)?,
        Commands::Delete { db, key } => commands::ops::delete(&engine, &db, &key)?,
        Commands::Scan {
            db,
            start,
            end,
            limit,
            reverse,
            format,
        } => {
            let options = commands::ops::scan_options(start, end, limit, reverse);
            commands::ops::scan(&engine, &db, &options, &format)?;
        }
        Commands::Version => {
            println!("lmdbx CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("lmdbx Core v{}", lmdbx_core::VERSION);
        }
    }

    Ok(())
}
