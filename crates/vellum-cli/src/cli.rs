//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use vellum::{PurgePolicy, SessionPolicy};

/// Vellum: turn spreadsheets into queryable vector store collections
#[derive(Parser)]
#[command(name = "vellum")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the schema each file would produce (no store needed)
    Schema {
        /// Data files (CSV/TSV/XLSX)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load files into the store, one collection per file
    Ingest {
        /// Data files (CSV/TSV/XLSX)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Output the ingestion result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load files, then answer questions about them
    Ask {
        /// Data files (CSV/TSV/XLSX)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,

        /// Question to ask (repeatable; reads stdin line by line when omitted)
        #[arg(short = 'q', long = "question")]
        questions: Vec<String>,

        /// Print the intermediate trace of each answer
        #[arg(long)]
        trace: bool,

        /// Pass each answer as context to the next question
        #[arg(long)]
        follow_up: bool,
    },
}

/// Options shared by commands that talk to the store.
#[derive(Args, Clone, Debug)]
pub struct StoreArgs {
    /// What to delete before ingesting (reset, additive)
    #[arg(long)]
    pub policy: Option<PurgePolicy>,

    /// When to replace the query session (process, per-batch)
    #[arg(long)]
    pub session: Option<SessionPolicy>,

    /// Ingest files in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Objects per batched write
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Use an in-memory store and mock query agent (no credentials needed)
    #[arg(long)]
    pub mock: bool,
}
