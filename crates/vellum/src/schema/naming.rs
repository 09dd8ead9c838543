//! Identifier sanitization for column and table labels.

use once_cell::sync::Lazy;
use regex::Regex;

/// Identifiers the store reserves for its own use.
pub const RESERVED_NAMES: &[&str] = &["id"];

/// Suffix appended to a sanitized name that is reserved.
pub const RESERVED_SUFFIX: &str = "_field";

static INVALID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

static VALID_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Turn an arbitrary label into a store-legal identifier.
///
/// Trims, lower-cases, maps spaces and every other character outside
/// `[A-Za-z0-9_]` to `_`, and prefixes `_` when the result does not start
/// with a letter or underscore. Total and idempotent; duplicates produced
/// by the mapping are left for the caller to resolve.
pub fn sanitize(raw_label: &str) -> String {
    let lowered = raw_label.trim().to_lowercase().replace(' ', "_");
    let mut name = INVALID_CHARS.replace_all(&lowered, "_").into_owned();
    let starts_ok = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok {
        name.insert(0, '_');
    }
    name
}

/// Returns true if the name collides with a reserved identifier.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Returns true if the name is a legal attribute identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    VALID_IDENTIFIER.is_match(name)
}
