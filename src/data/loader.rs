use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use serde::{Deserialize, Serialize};

use super::model::{
    infer_column_type, parse_timestamp, CellValue, ColumnData, ColumnType, Table,
};
use crate::error::IngestError;

// ---------------------------------------------------------------------------
// Formats and options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Extensions accepted by the file pickers.
    pub const EXTENSIONS: [&'static str; 3] = ["csv", "xlsx", "xls"];

    /// Case-insensitive, tolerates a leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            "xls" => Some(FileFormat::Xls),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Csv => "CSV",
            FileFormat::Xlsx => "XLSX",
            FileFormat::Xls => "XLS",
        })
    }
}

/// Which worksheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    Index(usize),
    Name(String),
}

/// Parser knobs. Every field has a default so partial config files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// CSV field separator; detected from the header line when `None`.
    pub delimiter: Option<char>,
    /// Worksheet for xlsx/xls; the first sheet when `None`.
    pub sheet: Option<SheetSelector>,
    /// Cell spellings read as missing values.
    pub na_values: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            sheet: None,
            na_values: ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl IngestOptions {
    fn is_na(&self, raw: &str) -> bool {
        let raw = raw.trim();
        self.na_values.iter().any(|na| na == raw)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// The extension of an uploaded file name, without the dot (`""` if none).
pub fn extension_of(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Parse an uploaded blob with default options. Dispatch by declared extension.
pub fn ingest(bytes: &[u8], declared_extension: &str) -> Result<Table, IngestError> {
    ingest_with(bytes, declared_extension, &IngestOptions::default())
}

/// Parse an uploaded blob.
///
/// Supported formats:
/// * `.csv`  – header row plus records; delimiter detected unless configured
/// * `.xlsx` / `.xls` – first row of the selected worksheet is the header
///
/// A header without data rows is a valid, empty table.
pub fn ingest_with(
    bytes: &[u8],
    declared_extension: &str,
    options: &IngestOptions,
) -> Result<Table, IngestError> {
    let format = FileFormat::from_extension(declared_extension).ok_or_else(|| {
        IngestError::UnsupportedFormat(declared_extension.trim_start_matches('.').to_string())
    })?;
    log::debug!("Ingesting {} bytes as {format}", bytes.len());

    let columns = match format {
        FileFormat::Csv => read_csv(bytes, options)?,
        FileFormat::Xlsx | FileFormat::Xls => read_workbook(bytes, format, options)?,
    };

    let table = Table::from_columns(columns)
        .map_err(|e| IngestError::parse(format, e))?
        .with_source_bytes(bytes.len());

    log::info!(
        "Parsed {format} file: {} rows x {} columns ({} bytes)",
        table.row_count(),
        table.column_count(),
        bytes.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Pick the candidate separator occurring most often (outside quotes) in the
/// header line. Ties go to the earlier candidate; no hits means a comma.
pub fn detect_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or_default();
    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut in_quotes = false;

    for &b in header {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = DELIMITER_CANDIDATES.iter().position(|&c| c == b) {
                counts[i] += 1;
            }
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    if counts[best] == 0 {
        b','
    } else {
        DELIMITER_CANDIDATES[best]
    }
}

fn read_csv(bytes: &[u8], options: &IngestOptions) -> Result<Vec<ColumnData>, IngestError> {
    let format = FileFormat::Csv;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let delimiter = match options.delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => {
            return Err(IngestError::parse(
                format,
                format!("delimiter '{c}' is not a single-byte character"),
            ))
        }
        None => detect_delimiter(bytes),
    };
    log::debug!("CSV delimiter: {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::parse(format, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        return Err(IngestError::parse(format, "no columns found"));
    }

    // Short records are padded with nulls; long ones are rejected.
    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in reader.records() {
        let record = result.map_err(|e| IngestError::parse(format, e))?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(IngestError::parse(
                format,
                format!(
                    "line {line} has {} fields, but the header has {}",
                    record.len(),
                    headers.len()
                ),
            ));
        }
        for (col, cells) in raw.iter_mut().enumerate() {
            let cell = record
                .get(col)
                .filter(|cell| !options.is_na(cell))
                .map(str::to_string);
            cells.push(cell);
        }
    }

    Ok(normalize_headers(headers)
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| csv_column(name, cells))
        .collect())
}

/// Type the raw cells; if the column ends up as text keep the original spelling
/// (so `007` stays `007` next to a word).
fn csv_column(name: String, raw: Vec<Option<String>>) -> ColumnData {
    let guessed: Vec<CellValue> = raw
        .iter()
        .map(|cell| cell.as_deref().map_or(CellValue::Null, guess_cell_type))
        .collect();
    if infer_column_type(&guessed) != ColumnType::Text {
        return ColumnData::new(name, guessed);
    }
    let text = raw
        .into_iter()
        .map(|cell| cell.map_or(CellValue::Null, CellValue::Text))
        .collect();
    ColumnData::new(name, text)
}

fn guess_cell_type(raw: &str) -> CellValue {
    let s = raw.trim();
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return if f.is_nan() {
            CellValue::Null
        } else {
            CellValue::Float(f)
        };
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return CellValue::Bool(s.eq_ignore_ascii_case("true"));
    }
    if let Some(ts) = parse_timestamp(s) {
        return CellValue::Timestamp(ts);
    }
    CellValue::Text(raw.to_string())
}

// ---------------------------------------------------------------------------
// Excel reader
// ---------------------------------------------------------------------------

fn read_workbook(
    bytes: &[u8],
    format: FileFormat,
    options: &IngestOptions,
) -> Result<Vec<ColumnData>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::parse(format, e))?;
    log::debug!("Workbook sheets: {:?}", workbook.sheet_names());

    let range = match &options.sheet {
        Some(SheetSelector::Name(name)) => workbook
            .worksheet_range(name)
            .map_err(|e| IngestError::parse(format, e))?,
        selector => {
            let index = match selector {
                Some(SheetSelector::Index(i)) => *i,
                _ => 0,
            };
            workbook
                .worksheet_range_at(index)
                .ok_or_else(|| {
                    IngestError::parse(format, format!("workbook has no sheet at index {index}"))
                })?
                .map_err(|e| IngestError::parse(format, e))?
        }
    };

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(IngestError::parse(format, "worksheet is empty"));
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            other => workbook_cell(other, options).to_string(),
        })
        .collect();

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            cells[col].push(workbook_cell(cell, options));
        }
    }

    Ok(normalize_headers(headers)
        .into_iter()
        .zip(cells)
        .map(|(name, values)| ColumnData::new(name, values))
        .collect())
}

/// Map a workbook cell. Integral floats become integers, the way dataframe
/// readers narrow whole-number spreadsheet columns.
fn workbook_cell(cell: &Data, options: &IngestOptions) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Integer(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if options.is_na(s) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(_) => cell.as_datetime().map_or(CellValue::Null, CellValue::Timestamp),
        Data::DateTimeIso(s) => {
            parse_timestamp(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::Timestamp)
        }
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Header normalisation
// ---------------------------------------------------------------------------

/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, … suffixes.
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    raw.into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = if name.trim().is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while seen.contains(&candidate) {
                candidate = format!("{base}.{suffix}");
                suffix += 1;
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_matching_is_lenient() {
        assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
        assert_eq!(FileFormat::from_extension(".xlsx"), Some(FileFormat::Xlsx));
        assert_eq!(FileFormat::from_extension("xls"), Some(FileFormat::Xls));
        assert_eq!(FileFormat::from_extension("txt"), None);
        assert_eq!(extension_of("sales.2024.CSV"), "CSV");
        assert_eq!(extension_of("README"), "");
    }

    #[test]
    fn unsupported_extension_is_rejected_before_parsing() {
        let err = ingest(b"a,b\n1,2\n", "txt").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ext) if ext == "txt"));
        let err = ingest(b"", ".json").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(ext) if ext == "json"));
    }

    #[test]
    fn detects_delimiters() {
        assert_eq!(detect_delimiter(b"a,b,c\n1,2,3"), b',');
        assert_eq!(detect_delimiter(b"a;b;c\n1;2;3"), b';');
        assert_eq!(detect_delimiter(b"a\tb\n1\t2"), b'\t');
        assert_eq!(detect_delimiter(b"\"x;y\",z\n"), b',');
        assert_eq!(detect_delimiter(b"single\n1\n"), b',');
        assert_eq!(detect_delimiter(b"a,b;c\n"), b',');
        assert_eq!(detect_delimiter(b"a|b;c\n"), b';');
        assert_eq!(detect_delimiter(b""), b',');
    }

    #[test]
    fn reads_semicolon_csv_with_types() {
        let csv = "name;age;score;member;joined\n\
                   ana;31;7.5;true;2024-01-05\n\
                   bruno;28;NA;false;2024-02-10\n";
        let table = ingest(csv.as_bytes(), "csv").unwrap();
        assert_eq!(table.shape(), (2, 5));
        assert_eq!(table.source_bytes(), csv.len());

        let types: Vec<ColumnType> = table.columns().map(|c| c.column_type()).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Text,
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Boolean,
                ColumnType::Temporal
            ]
        );
        assert_eq!(table.column("score").unwrap().value(1), CellValue::Null);
    }

    #[test]
    fn mixed_columns_keep_original_text() {
        let table = ingest(b"code\n007\nabc\n", "csv").unwrap();
        let code = table.column("code").unwrap();
        assert_eq!(code.column_type(), ColumnType::Text);
        assert_eq!(code.value(0), CellValue::Text("007".into()));
    }

    #[test]
    fn header_only_csv_is_an_empty_table() {
        let table = ingest(b"a,b,c\n", "csv").unwrap();
        assert_eq!(table.shape(), (0, 3));
    }

    #[test]
    fn empty_file_has_no_columns() {
        let err = ingest(b"", "csv").unwrap_err();
        assert!(matches!(err, IngestError::Parse { format: FileFormat::Csv, .. }));
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let table = ingest(b"a,b\n1,2\n3\n", "csv").unwrap();
        assert_eq!(table.shape(), (2, 2));
        let b = table.column("b").unwrap();
        assert_eq!(b.value(0), CellValue::Integer(2));
        assert_eq!(b.value(1), CellValue::Null);
        assert_eq!(table.column("a").unwrap().value(1), CellValue::Integer(3));
    }

    #[test]
    fn long_rows_fail_to_parse() {
        let err = ingest(b"a,b\n1,2\n3,4,5\n", "csv").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
        assert!(err.to_string().contains("line 3 has 3 fields"));
    }

    #[test]
    fn invalid_utf8_fails_to_parse() {
        let err = ingest(b"name\n\xff\xfe\n", "csv").unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let table = ingest(b"\xEF\xBB\xBFid,v\n1,2\n", "csv").unwrap();
        assert_eq!(table.column_names(), vec!["id", "v"]);
    }

    #[test]
    fn headers_are_made_unique() {
        assert_eq!(
            normalize_headers(vec![
                "a".into(),
                "".into(),
                "a".into(),
                "a.1".into(),
                "a".into()
            ]),
            vec!["a", "Unnamed: 1", "a.1", "a.1.1", "a.2"]
        );
    }

    #[test]
    fn configured_delimiter_and_na_values_apply() {
        let options = IngestOptions {
            delimiter: Some('|'),
            na_values: vec!["-".into()],
            ..IngestOptions::default()
        };
        let table = ingest_with(b"x|y\n1|-\n2|3\n", "csv", &options).unwrap();
        let y = table.column("y").unwrap();
        assert_eq!(y.column_type(), ColumnType::Integer);
        assert_eq!(y.null_count(), 1);

        let bad = IngestOptions {
            delimiter: Some('§'),
            ..IngestOptions::default()
        };
        assert!(ingest_with(b"x\n1\n", "csv", &bad).is_err());
    }

    #[test]
    fn garbage_workbook_fails_to_parse() {
        let err = ingest(b"definitely not a zip archive", "xlsx").unwrap_err();
        assert!(matches!(err, IngestError::Parse { format: FileFormat::Xlsx, .. }));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: IngestOptions = serde_json::from_str(r#"{"sheet": "Dados"}"#).unwrap();
        assert_eq!(options.sheet, Some(SheetSelector::Name("Dados".into())));
        assert_eq!(options.delimiter, None);
        assert!(options.na_values.iter().any(|na| na == "NA"));

        let options: IngestOptions = serde_json::from_str(r#"{"sheet": 2, "delimiter": ";"}"#).unwrap();
        assert_eq!(options.sheet, Some(SheetSelector::Index(2)));
        assert_eq!(options.delimiter, Some(';'));
    }
}
