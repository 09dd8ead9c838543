//! Numeric-vs-text decision for a column.

use crate::input::CellValue;
use crate::schema::AttributeKind;

/// Value counts behind a kind decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindAnalysis {
    /// Non-absent numeric values.
    pub numeric_count: usize,
    /// Non-absent values that are not numbers.
    pub text_count: usize,
    /// Absent values.
    pub absent_count: usize,
}

impl KindAnalysis {
    /// Count the values of one column.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let mut analysis = Self::default();
        for value in values {
            match value {
                CellValue::Absent => analysis.absent_count += 1,
                v if v.is_numeric() => analysis.numeric_count += 1,
                _ => analysis.text_count += 1,
            }
        }
        analysis
    }

    /// Numeric only when every present value is a number.
    ///
    /// A column with no present values is reported as text; such columns
    /// are dropped before schema construction.
    pub fn kind(&self) -> AttributeKind {
        if self.text_count == 0 && self.numeric_count > 0 {
            AttributeKind::Numeric
        } else {
            AttributeKind::Text
        }
    }

    /// Returns true if no value in the column is present.
    pub fn is_all_absent(&self) -> bool {
        self.numeric_count == 0 && self.text_count == 0
    }
}

/// Infer the attribute kind of a column.
pub fn infer_kind<'a>(values: impl IntoIterator<Item = &'a CellValue>) -> AttributeKind {
    KindAnalysis::from_values(values).kind()
}
