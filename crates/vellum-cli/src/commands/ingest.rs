//! Ingest command - load files into the store.

use std::path::PathBuf;

use crate::cli::StoreArgs;

use super::{open_context, print_ingestion};

pub fn run(
    files: Vec<PathBuf>,
    store: StoreArgs,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let vellum = open_context(&store)?;
    let result = vellum.ingest_paths(&files);
    vellum.close();
    let result = result?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_ingestion(&result);
    }

    if !result.has_collections() {
        return Err("no collection was created".into());
    }
    Ok(())
}
