//! Table-level schema definition.

use serde::{Deserialize, Serialize};

use super::types::AttributeKind;

/// One typed attribute of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Sanitized identifier, unique within its schema.
    pub name: String,
    /// Stored type.
    pub kind: AttributeKind,
}

impl AttributeSpec {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Mapping of one source column onto an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Column position in the source table.
    pub position: usize,
    /// Label as it appeared in the file.
    pub original: String,
    /// Attribute name the column is stored under.
    pub attribute: String,
}

/// Ordered renames from source columns to attributes.
///
/// Keyed by position so that files with repeated header labels keep every
/// column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMap {
    entries: Vec<ColumnRename>,
}

impl RenameMap {
    /// Create an empty rename map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column rename.
    pub fn insert(
        &mut self,
        position: usize,
        original: impl Into<String>,
        attribute: impl Into<String>,
    ) {
        self.entries.push(ColumnRename {
            position,
            original: original.into(),
            attribute: attribute.into(),
        });
    }

    /// Attribute name for the first column carrying this label.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.original == original)
            .map(|e| e.attribute.as_str())
    }

    /// Attribute name for a column position.
    pub fn get_by_position(&self, position: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.position == position)
            .map(|e| e.attribute.as_str())
    }

    /// Iterate over renames in column order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnRename> {
        self.entries.iter()
    }

    /// Number of mapped columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no columns are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Schema for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Target collection name.
    pub table_name: String,
    /// Attributes in source column order.
    pub attributes: Vec<AttributeSpec>,
    /// Source column to attribute mapping.
    pub renames: RenameMap,
}

impl TableSchema {
    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get all attribute names.
    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Get the number of attributes.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Render the description handed to the query layer as context.
    pub fn describe(&self) -> String {
        let mut desc = format!("Table: {}\n", self.table_name);
        for attribute in &self.attributes {
            desc.push_str(&format!("- {}: {}\n", attribute.name, attribute.kind.label()));
        }
        desc
    }
}
