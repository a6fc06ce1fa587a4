//! CSV and spreadsheet ingestion.
//!
//! Files carry no fixed schema: every cell of every data row is scanned with
//! embedded recognition, so an address in any column is picked up. A cell of
//! unrelated text that happens to contain an address-shaped substring is
//! picked up too.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;
use std::path::Path;

use super::address::AddressSet;
use super::error::{RecipientError, RecipientResult};
use super::normalize::collect_embedded;

/// Tabular file kinds accepted for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Pick the parser from the file extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> RecipientResult<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("xlsx") | Some("xls") => Ok(SourceFormat::Workbook),
            _ => Err(RecipientError::UnsupportedFormat(file_name.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "CSV",
            SourceFormat::Workbook => "spreadsheet",
        }
    }
}

/// One data row keyed by column header, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabularRecord {
    cells: Vec<(String, String)>,
}

impl TabularRecord {
    fn from_row<I>(headers: &[String], values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let cells = values
            .into_iter()
            .enumerate()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(index, value)| (column_key(headers, index), value))
            .collect();

        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(key, _)| key == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, value)| value.as_str())
    }
}

/// Header text for a column, or `column_<n>` when the header is blank or the
/// row is wider than the header.
fn column_key(headers: &[String], index: usize) -> String {
    headers
        .get(index)
        .map(|header| header.trim())
        .filter(|header| !header.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("column_{}", index + 1))
}

/// Parse delimited text whose first row is the header.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, and
/// rows may be shorter or longer than the header.
pub fn read_csv(bytes: &[u8]) -> RecipientResult<Vec<TabularRecord>> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| RecipientError::parse(SourceFormat::Csv.label(), e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| RecipientError::parse(SourceFormat::Csv.label(), e))?;
        records.push(TabularRecord::from_row(
            &headers,
            row.iter().map(str::to_string),
        ));
    }

    Ok(records)
}

/// Parse the first worksheet of an `.xlsx` or `.xls` workbook.
///
/// The first used row is the header. Later sheets are ignored.
pub fn read_first_worksheet(bytes: &[u8]) -> RecipientResult<Vec<TabularRecord>> {
    let label = SourceFormat::Workbook.label();
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| RecipientError::parse(label, e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| RecipientError::parse(label, e))?,
        None => return Ok(Vec::new()),
    };

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_text).collect(),
        None => return Ok(Vec::new()),
    };

    Ok(rows
        .map(|row| TabularRecord::from_row(&headers, row.iter().map(cell_text)))
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Parse a tabular upload into records, dispatching on the file name.
pub fn parse_records(bytes: &[u8], file_name: &str) -> RecipientResult<Vec<TabularRecord>> {
    let format = SourceFormat::from_file_name(file_name)?;
    if bytes.is_empty() {
        return Err(RecipientError::EmptyFile);
    }

    match format {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Workbook => read_first_worksheet(bytes),
    }
}

/// Extract the deduplicated addresses found anywhere in a tabular upload.
pub fn extract_addresses(bytes: &[u8], file_name: &str) -> RecipientResult<AddressSet> {
    let records = parse_records(bytes, file_name)?;
    let addresses = collect_embedded(records.iter().flat_map(TabularRecord::values));

    log::debug!(
        "extracted {} unique addresses from {} rows of '{}'",
        addresses.len(),
        records.len(),
        file_name
    );

    Ok(addresses)
}
