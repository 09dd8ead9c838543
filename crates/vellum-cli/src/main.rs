//! Vellum CLI - load spreadsheets into a vector store and query them.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::ask::AskOptions;
use tracing_subscriber::EnvFilter;

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Schema { files, json } => commands::schema::run(files, json),

        Commands::Ingest {
            files,
            store,
            json,
        } => commands::ingest::run(files, store, json),

        Commands::Ask {
            files,
            store,
            questions,
            trace,
            follow_up,
        } => commands::ask::run(files, store, questions, AskOptions { trace, follow_up }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "vellum=debug" } else { "vellum=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}
