//! Example: Run the ingestion pipeline against an in-memory store.
//!
//! Usage:
//!   cargo run --example dry_run -- <file_path>...
//!
//! Example:
//!   cargo run --example dry_run -- sites.xlsx alarms.csv

use std::env;
use std::sync::Arc;

use vellum::{InMemoryStore, MockQueryCapability, VectorizerPolicy, Vellum, VellumConfig};

fn main() -> vellum::Result<()> {
    let paths: Vec<String> = env::args().skip(1).collect();

    if paths.is_empty() {
        eprintln!("Usage: cargo run --example dry_run -- <file_path>...");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example dry_run -- sites.xlsx alarms.csv");
        std::process::exit(1);
    }

    let store = Arc::new(InMemoryStore::new());
    let vellum = Vellum::new(
        store.clone(),
        Arc::new(MockQueryCapability::new()),
        VectorizerPolicy::default(),
        VellumConfig::default(),
    );

    let result = vellum.ingest_paths(&paths)?;

    println!("=== Schemas ===\n");
    println!("{}", result.schema_text);

    println!("=== Collections ===\n");
    for summary in &result.summaries {
        println!(
            "  {} <- {} ({} rows stored, {} rejected)",
            summary.collection,
            summary.file,
            store.object_count(&summary.collection),
            summary.load.rejected
        );
    }

    if !result.failures.is_empty() {
        println!("\n=== Failures ===\n");
        for failure in &result.failures {
            println!("  {} [{}]: {}", failure.file, failure.kind, failure.reason);
        }
    }

    if result.has_collections() {
        vellum.ensure_session(&result)?;
        let answer = vellum.ask("How many rows does each table hold?")?;
        println!("\n=== Mock answer ===\n");
        println!("  {}", answer.final_answer);
    }

    Ok(())
}
