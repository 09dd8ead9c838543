//! Attribute schemas for collections.

mod builder;
mod naming;
mod table;
mod types;

pub use builder::SchemaBuilder;
pub use naming::{is_reserved, is_valid_identifier, sanitize, RESERVED_NAMES, RESERVED_SUFFIX};
pub use table::{AttributeSpec, ColumnRename, RenameMap, TableSchema};
pub use types::AttributeKind;
