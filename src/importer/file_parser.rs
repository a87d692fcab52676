// ==========================================
// Bedna workflow - file parser
// ==========================================
// Supported: Excel (.xlsx/.xls) / CSV (.csv)
// Reads the first sheet into a RawSheet: the header row as-is plus
// at most `max_rows` data rows, stopping at the first fully blank row.
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::path::Path;

// ==========================================
// RawSheet
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// Collect data rows until the first fully blank one or `max_rows`
    pub fn from_rows<I>(headers: Vec<String>, rows: I, max_rows: usize) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut collected = Vec::new();
        for row in rows {
            if collected.len() >= max_rows || row.iter().all(|v| v.trim().is_empty()) {
                break;
            }
            collected.push(row);
        }
        Self {
            headers,
            rows: collected,
        }
    }
}

pub trait FileParser {
    fn parse_sheet(&self, file_path: &Path, max_rows: usize) -> ImportResult<RawSheet>;
}

fn check_file(path: &Path, allowed: &[&str]) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let ext = extension(path);
    if !allowed.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedFormat(ext));
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// Parse CSV text; the delimiter (`;` or `,`) is taken from the header line
    pub fn parse_text(&self, text: &str, max_rows: usize) -> ImportResult<RawSheet> {
        let text = text.trim_start_matches('\u{feff}');
        let header_line = text.lines().next().unwrap_or("");
        let delimiter = if header_line.matches(';').count() > header_line.matches(',').count() {
            b';'
        } else {
            b','
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(ImportError::EmptySheet);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
            if rows.len() > max_rows {
                break;
            }
        }
        Ok(RawSheet::from_rows(headers, rows, max_rows))
    }
}

impl FileParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path, max_rows: usize) -> ImportResult<RawSheet> {
        check_file(file_path, &["csv"])?;
        let text = std::fs::read_to_string(file_path)?;
        self.parse_text(&text, max_rows)
    }
}

// ==========================================
// Excel
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path, max_rows: usize) -> ImportResult<RawSheet> {
        check_file(file_path, &["xlsx", "xls"])?;

        let mut workbook = open_workbook_auto(file_path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(ImportError::EmptySheet)?
            .iter()
            .map(|cell| cell.to_string())
            .collect();

        let data = rows.map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect::<Vec<_>>()
        });
        Ok(RawSheet::from_rows(headers, data, max_rows))
    }
}

// ==========================================
// Picks the parser by file extension
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_sheet(&self, file_path: &Path, max_rows: usize) -> ImportResult<RawSheet> {
        match extension(file_path).as_str() {
            "csv" => CsvParser.parse_sheet(file_path, max_rows),
            "xlsx" | "xls" => ExcelParser.parse_sheet(file_path, max_rows),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
