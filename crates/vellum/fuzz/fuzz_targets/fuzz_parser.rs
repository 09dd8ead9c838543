//! Fuzz target for the upload parser and schema builder.
//!
//! Arbitrary bytes are fed through both the delimited and the workbook
//! paths. Parsing may fail but must never panic, and any table that parses
//! must produce either a schema or an empty-data error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vellum::{Parser, SchemaBuilder, UploadedFile};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    let builder = SchemaBuilder::new();

    for name in ["upload.csv", "upload.xlsx"] {
        let file = UploadedFile::new(name, data.to_vec());
        if let Ok((table, _)) = parser.parse(&file) {
            let _ = builder.build("upload", &table);
        }
    }
});
