//! Fuzz target for label sanitization.
//!
//! Every label must map to a legal identifier, and sanitizing twice must
//! give the same result as sanitizing once.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vellum::schema::{is_valid_identifier, sanitize};

fuzz_target!(|data: &[u8]| {
    let label = String::from_utf8_lossy(data);
    let name = sanitize(&label);

    assert!(is_valid_identifier(&name), "{:?} -> {:?}", label, name);
    assert_eq!(sanitize(&name), name);
});
