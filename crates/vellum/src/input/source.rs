//! Uploaded files, raw cell values and parsed tables.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, VellumError};

/// A file handed over by the upload surface.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as uploaded, including the extension.
    pub name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Create an uploaded file from a name and its contents.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| VellumError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, bytes })
    }

    /// Lower-cased extension without the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// A single raw scalar read from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Whole number.
    Integer(i64),
    /// Floating-point number (always finite).
    Float(f64),
    /// Anything that is not a number.
    Text(String),
    /// Blank cell.
    Absent,
}

impl CellValue {
    /// Classify a textual cell the way delimited files are read.
    ///
    /// Blank cells are absent. Non-finite floats such as `inf` or `NaN`
    /// stay text.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Absent;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// Returns true if the cell holds no value.
    pub fn is_absent(&self) -> bool {
        matches!(self, CellValue::Absent)
    }

    /// Returns true if the cell holds a number.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }

    /// Convert to a JSON value, or `None` when absent.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            CellValue::Integer(i) => Some(serde_json::Value::from(*i)),
            CellValue::Float(f) => serde_json::Number::from_f64(*f).map(serde_json::Value::Number),
            CellValue::Text(s) => Some(serde_json::Value::String(s.clone())),
            CellValue::Absent => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Absent => Ok(()),
        }
    }
}

/// Metadata about an uploaded file that has been parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name as uploaded.
    pub file: String,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, xlsx, ...).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns, before all-absent columns are dropped.
    pub column_count: usize,
    /// When the file was parsed.
    pub parsed_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been parsed.
    pub fn new(file: &UploadedFile, format: String, table: &RawTable) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&file.bytes);
        let hash = format!("sha256:{:x}", hasher.finalize());

        Self {
            file: file.name.clone(),
            hash,
            size_bytes: file.bytes.len() as u64,
            format,
            row_count: table.row_count(),
            column_count: table.column_count(),
            parsed_at: Utc::now(),
        }
    }
}

static ABSENT: CellValue = CellValue::Absent;

/// Parsed tabular data, held only while one file is processed.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Column labels as they appear in the file.
    pub headers: Vec<String>,
    /// Row data (row-major order), every row as wide as `headers`.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Create a new table, padding or truncating rows to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Absent);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows
            .iter()
            .map(move |row| row.get(index).unwrap_or(&ABSENT))
    }

    /// Returns true if every value in the column is absent.
    pub fn is_column_absent(&self, index: usize) -> bool {
        self.column_values(index).all(CellValue::is_absent)
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_classification() {
        assert_eq!(CellValue::from_text("42"), CellValue::Integer(42));
        assert_eq!(CellValue::from_text(" 3.5 "), CellValue::Float(3.5));
        assert_eq!(CellValue::from_text(""), CellValue::Absent);
        assert_eq!(CellValue::from_text("   "), CellValue::Absent);
        assert_eq!(CellValue::from_text("N/A"), CellValue::Text("N/A".into()));
        assert_eq!(CellValue::from_text("NaN"), CellValue::Text("NaN".into()));
        assert_eq!(CellValue::from_text("inf"), CellValue::Text("inf".into()));
    }

    #[test]
    fn test_rows_padded_to_header_width() {
        let table = RawTable::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1)],
                vec![
                    CellValue::Integer(2),
                    CellValue::Integer(3),
                    CellValue::Integer(4),
                ],
            ],
        );
        assert_eq!(table.get(0, 1), Some(&CellValue::Absent));
        assert_eq!(table.rows[1].len(), 2);
    }

    #[test]
    fn test_absent_column_detection() {
        let table = RawTable::new(
            vec!["a".into(), "empty".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::Absent],
                vec![CellValue::Absent, CellValue::Absent],
            ],
        );
        assert!(!table.is_column_absent(0));
        assert!(table.is_column_absent(1));
    }

    #[test]
    fn test_extension_is_lowercased() {
        let file = UploadedFile::new("Site Report.XLSX", Vec::new());
        assert_eq!(file.extension().as_deref(), Some("xlsx"));
        assert_eq!(UploadedFile::new("README", Vec::new()).extension(), None);
    }

    #[test]
    fn test_json_conversion_omits_absent() {
        assert_eq!(CellValue::Absent.to_json(), None);
        assert_eq!(
            CellValue::Integer(5).to_json(),
            Some(serde_json::json!(5))
        );
        assert_eq!(
            CellValue::Text("x".into()).to_json(),
            Some(serde_json::json!("x"))
        );
    }
}
