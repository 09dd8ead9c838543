//! Upload parsing into raw tables.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{CellValue, RawTable, SourceMetadata, UploadedFile};
