//! Regional sales file parser with encoding and delimiter auto-detection.
//!
//! Turns one delimited file into [`RawTransaction`] rows. Values are kept as
//! text; conversion happens in [`crate::transform::normalize`].

use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::RawTransaction;

/// Columns every source file must name in its header row.
pub const REQUIRED_COLUMNS: [&str; 5] = ["product", "quantity", "price", "date", "region"];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Rows in file order
    pub records: Vec<RawTransaction>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Column headers as found in the file
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let content = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::EncodingError(e.to_string()))?,
        "iso-8859-15" | "latin-9" | "latin9" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        // Windows-1252 agrees with Latin-1 on every printable byte.
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    // Excel-exported files often carry a BOM that would corrupt the first header.
    Ok(content.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse a source file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_sales_file("data/daily_sales_data_0.csv")?;
/// println!("{} rows, delimiter '{}'", result.records.len(), result.delimiter);
/// ```
pub fn parse_sales_file<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse source bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    parse_str(&content, delimiter, encoding)
}

/// Parse decoded content with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(columns.extract(&record)?);
    }

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    product: usize,
    quantity: usize,
    price: usize,
    date: usize,
    region: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> CsvResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| CsvError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            product: find(REQUIRED_COLUMNS[0])?,
            quantity: find(REQUIRED_COLUMNS[1])?,
            price: find(REQUIRED_COLUMNS[2])?,
            date: find(REQUIRED_COLUMNS[3])?,
            region: find(REQUIRED_COLUMNS[4])?,
        })
    }

    fn extract(&self, record: &StringRecord) -> CsvResult<RawTransaction> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let expected = self.width();
        let field = |i: usize, column: &str| {
            record
                .get(i)
                .map(str::to_string)
                .ok_or_else(|| CsvError::MissingField {
                    line,
                    column: column.to_string(),
                    expected,
                    found: record.len(),
                })
        };

        Ok(RawTransaction {
            line,
            product: field(self.product, REQUIRED_COLUMNS[0])?,
            quantity: field(self.quantity, REQUIRED_COLUMNS[1])?,
            price: field(self.price, REQUIRED_COLUMNS[2])?,
            date: field(self.date, REQUIRED_COLUMNS[3])?,
            region: field(self.region, REQUIRED_COLUMNS[4])?,
        })
    }

    /// Fields a row needs to reach every required column.
    fn width(&self) -> usize {
        [self.product, self.quantity, self.price, self.date, self.region]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}
