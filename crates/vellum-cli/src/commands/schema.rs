//! Schema command - show the schema each file would produce.

use std::path::PathBuf;

use colored::Colorize;
use vellum::{derive_collection_name, Parser, SchemaBuilder, UploadedFile};

pub fn run(files: Vec<PathBuf>, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let parser = Parser::new();
    let builder = SchemaBuilder::new();
    let mut reports = Vec::new();
    let mut failed = 0;

    for path in &files {
        let outcome = UploadedFile::from_path(path).and_then(|file| {
            let name = derive_collection_name(&file.name);
            let (table, source) = parser.parse(&file)?;
            let (schema, description) = builder.build(&name, &table)?;
            Ok((source, schema, description))
        });

        match outcome {
            Ok((source, schema, description)) => {
                if json_output {
                    reports.push(serde_json::json!({
                        "source": source,
                        "schema": schema,
                        "description": description,
                    }));
                } else {
                    println!("{}", description.trim_end());
                    for rename in schema.renames.iter() {
                        if rename.original != rename.attribute {
                            println!(
                                "  {} '{}' -> {}",
                                "renamed".dimmed(),
                                rename.original,
                                rename.attribute.cyan()
                            );
                        }
                    }
                    println!();
                }
            }
            Err(e) => {
                failed += 1;
                if json_output {
                    reports.push(serde_json::json!({
                        "file": path.display().to_string(),
                        "kind": e.kind(),
                        "error": e.to_string(),
                    }));
                } else {
                    eprintln!("{} {}: {}", "✗".red().bold(), path.display(), e);
                }
            }
        }
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if failed == files.len() {
        return Err("no file could be read as tabular data".into());
    }
    Ok(())
}
