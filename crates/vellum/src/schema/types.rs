//! Attribute type definitions.

use serde::{Deserialize, Serialize};

/// Stored type of a collection attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Integer or floating-point values.
    Numeric,
    /// Free text.
    Text,
}

impl AttributeKind {
    /// Label used in schema descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            AttributeKind::Numeric => "Number",
            AttributeKind::Text => "Text",
        }
    }

    /// Data type name understood by the store.
    pub fn store_type(&self) -> &'static str {
        match self {
            AttributeKind::Numeric => "number",
            AttributeKind::Text => "text",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
