//! CLI command implementations.

pub mod ask;
pub mod ingest;
pub mod schema;

use std::sync::Arc;

use colored::Colorize;
use tracing::{info, warn};
use vellum::{
    DocumentStore, InMemoryStore, IngestionResult, MockQueryCapability, StoreConfig,
    VectorizerPolicy, Vellum, VellumConfig,
};

use crate::cli::StoreArgs;

/// Build the context for a store-backed command.
///
/// Configuration and connection failures are fatal. The store connection is
/// released on Ctrl-C as well as on normal exit.
pub fn open_context(args: &StoreArgs) -> Result<Vellum, Box<dyn std::error::Error>> {
    let mut config = VellumConfig::from_env()?;
    if let Some(policy) = args.policy {
        config.ingest.purge = policy;
    }
    if let Some(policy) = args.session {
        config.query.session_policy = policy;
    }
    if let Some(size) = args.batch_size {
        config.ingest.batch_size = size;
    }
    config.ingest.parallel = args.parallel;

    let vellum = if args.mock {
        info!("using in-memory store and mock query agent");
        Vellum::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(MockQueryCapability::new()),
            VectorizerPolicy::default(),
            config,
        )
    } else {
        let store_config = StoreConfig::from_env()?;
        Vellum::connect(&store_config, config)?
    };

    let store = vellum.store().clone();
    if let Err(e) = ctrlc::set_handler(move || {
        store.close();
        std::process::exit(130);
    }) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    Ok(vellum)
}

/// Print successes and failures of an ingestion run.
pub fn print_ingestion(result: &IngestionResult) {
    if !result.purged.is_empty() {
        println!(
            "{} {} existing collection(s)",
            "Cleared".cyan(),
            result.purged.len()
        );
    }

    for summary in &result.summaries {
        println!(
            "{} {} {} ({} attributes, {} rows)",
            "✓".green().bold(),
            "Uploaded and created collection:".green(),
            summary.collection.white().bold(),
            summary.attributes,
            summary.load.accepted
        );
        if summary.load.is_partial() {
            println!(
                "  {} {} of {} rows rejected",
                "!".yellow().bold(),
                summary.load.rejected,
                summary.load.attempted
            );
            for sample in &summary.load.failure_samples {
                println!("    {}", sample.dimmed());
            }
        }
    }

    for failure in &result.failures {
        println!(
            "{} {} {} [{}]: {}",
            "✗".red().bold(),
            "Failed to ingest".red(),
            failure.file.white().bold(),
            failure.kind,
            failure.reason
        );
    }
}
