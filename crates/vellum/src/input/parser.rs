//! Delimited-text and workbook parser with delimiter detection.

use std::io::{BufRead, BufReader, Cursor};

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::error::{Result, VellumError};
use super::source::{CellValue, RawTable, SourceMetadata, UploadedFile};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Extensions read as delimited text.
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Extensions read as spreadsheet workbooks.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use for text files (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses uploaded tabular files.
#[derive(Debug, Clone)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse an uploaded file and return the table and its metadata.
    pub fn parse(&self, file: &UploadedFile) -> Result<(RawTable, SourceMetadata)> {
        let extension = file.extension().unwrap_or_default();

        let (table, format) = if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            (self.parse_workbook(&file.bytes)?, extension)
        } else if DELIMITED_EXTENSIONS.contains(&extension.as_str()) {
            let delimiter = match self.config.delimiter {
                Some(d) => d,
                None => detect_delimiter(&file.bytes)?,
            };
            let format = match delimiter {
                b'\t' => "tsv",
                b',' => "csv",
                b';' => "csv-semicolon",
                b'|' => "psv",
                _ => "delimited",
            }
            .to_string();
            (self.parse_delimited(&file.bytes, delimiter)?, format)
        } else {
            return Err(VellumError::UnsupportedFormat(format!(
                "'{}' is not a .csv or .xlsx file",
                file.name
            )));
        };

        debug!(
            file = %file.name,
            format = %format,
            rows = table.row_count(),
            columns = table.column_count(),
            "parsed upload"
        );

        let metadata = SourceMetadata::new(file, format, &table);
        Ok((table, metadata))
    }

    /// Parse delimited text.
    fn parse_delimited(&self, bytes: &[u8], delimiter: u8) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers = normalize_headers(reader.headers()?.iter().map(|s| s.to_string()));
        if headers.is_empty() {
            return Err(VellumError::EmptyData("No columns found".to_string()));
        }

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            rows.push(record.iter().map(CellValue::from_text).collect());
        }

        if rows.is_empty() {
            return Err(VellumError::EmptyData("No data rows found".to_string()));
        }

        Ok(RawTable::new(headers, rows))
    }

    /// Parse the first sheet of a workbook.
    fn parse_workbook(&self, bytes: &[u8]) -> Result<RawTable> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| VellumError::EmptyData("Workbook has no sheets".to_string()))?;
        let range = workbook.worksheet_range(&sheet)?;

        self.range_to_table(&range)
    }

    /// Convert a sheet range, using the first non-empty row as the header.
    fn range_to_table(&self, range: &Range<Data>) -> Result<RawTable> {
        let mut row_iter = range
            .rows()
            .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

        let header_row = row_iter
            .next()
            .ok_or_else(|| VellumError::EmptyData("Sheet has no header row".to_string()))?;
        let headers = normalize_headers(header_row.iter().map(header_label));

        let mut rows = Vec::new();
        for (row_idx, row) in row_iter.enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }
            // Trailing formatting can leave fully blank rows in the used range.
            if row.iter().all(|c| matches!(c, Data::Empty)) {
                continue;
            }
            rows.push(row.iter().map(workbook_cell).collect());
        }

        if rows.is_empty() {
            return Err(VellumError::EmptyData("No data rows found".to_string()));
        }

        Ok(RawTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace blank header labels with positional names.
fn normalize_headers(labels: impl Iterator<Item = String>) -> Vec<String> {
    labels
        .enumerate()
        .map(|(i, label)| {
            if label.trim().is_empty() {
                format!("column_{}", i + 1)
            } else {
                label
            }
        })
        .collect()
}

fn header_label(cell: &Data) -> String {
    match cell {
        Data::Float(f) if f.fract() == 0.0 => (*f as i64).to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.is_finite() => CellValue::Float(*f),
        Data::Float(f) => CellValue::Text(f.to_string()),
        Data::String(s) if s.trim().is_empty() => CellValue::Absent,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Empty | Data::Error(_) => CellValue::Absent,
        other => CellValue::Text(other.to_string()),
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(VellumError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Tab gets a slight bonus as it's less common inside actual values
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
