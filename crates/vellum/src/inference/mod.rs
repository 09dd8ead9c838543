//! Attribute type inference from column values.

mod kind;

pub use kind::{infer_kind, KindAnalysis};
