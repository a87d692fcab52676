// ==========================================
// Bedna workflow - import strategy contract
// ==========================================
// One strategy per customer spreadsheet layout, looked up by
// customer code. Every strategy maps named source columns onto
// ImportRow; header normalization, the required-column check,
// issue collection and the preview are shared.
// ==========================================

use crate::domain::import::{ImportIssue, ImportPreview, ImportRow, IssueLevel, ParseOutcome};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawSheet;
use crate::importer::header_normalizer::HeaderNormalizer;
use crate::importer::strategies::{EurStrategy, RchStrategy, SpxStrategy};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const URGENT_KEYWORDS: &[&str] = &["eilig"];
pub const PHOSPHATE_KEYWORDS: &[&str] = &["phosphat", "phosphate"];

const PREVIEW_COLUMNS: &[&str] = &[
    "row",
    "article",
    "batch",
    "diameter",
    "length",
    "specification",
    "head type",
    "net weight",
    "tare weight",
    "quantity",
    "priority",
    "phosphate",
];

/// Canonical field and the normalized source headers that feed it
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

// ==========================================
// SheetRow - one data row addressed by header alias
// ==========================================
pub struct SheetRow<'a> {
    pub row_number: usize,
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> SheetRow<'a> {
    pub fn new(row_number: usize, headers: &'a [String], values: &'a [String]) -> Self {
        Self {
            row_number,
            headers,
            values,
        }
    }

    /// First non-blank value among the alias columns
    pub fn get(&self, aliases: &[&str]) -> Option<&'a str> {
        aliases.iter().find_map(|alias| {
            let idx = self.headers.iter().position(|h| h == alias)?;
            let value = self.values.get(idx)?.trim();
            (!value.is_empty()).then_some(value)
        })
    }

    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        self.get(aliases).and_then(DataCleaner::clean_text)
    }

    /// Decimal cell; an unparseable value is reported and yields None
    pub fn decimal(&self, field: &str, aliases: &[&str], issues: &mut Vec<ImportIssue>) -> Option<Decimal> {
        let raw = self.get(aliases)?;
        let parsed = DataCleaner::parse_decimal(raw);
        if parsed.is_none() {
            issues.push(ImportIssue::error(
                Some(self.row_number),
                Some(field),
                format!("'{}' is not a number", raw),
            ));
        }
        parsed
    }

    /// Like `decimal`, but a blank cell is reported as well
    pub fn required_decimal(
        &self,
        field: &str,
        aliases: &[&str],
        issues: &mut Vec<ImportIssue>,
    ) -> Option<Decimal> {
        if self.get(aliases).is_none() {
            issues.push(ImportIssue::error(
                Some(self.row_number),
                Some(field),
                format!("{} is missing", field),
            ));
            return None;
        }
        self.decimal(field, aliases, issues)
    }

    pub fn quantity(&self, aliases: &[&str], issues: &mut Vec<ImportIssue>) -> Option<i64> {
        let raw = self.get(aliases)?;
        let parsed = DataCleaner::parse_quantity(raw);
        if parsed.is_none() {
            issues.push(ImportIssue::error(
                Some(self.row_number),
                Some("quantity"),
                format!("'{}' is not a whole piece count", raw),
            ));
        }
        parsed
    }

    /// Combined "diameter x length" cell
    pub fn dimension(
        &self,
        aliases: &[&str],
        issues: &mut Vec<ImportIssue>,
    ) -> (Option<Decimal>, Option<Decimal>) {
        let Some(raw) = self.get(aliases) else {
            issues.push(ImportIssue::error(
                Some(self.row_number),
                Some("dimension"),
                "dimension is missing",
            ));
            return (None, None);
        };
        match DataCleaner::split_dimension(raw) {
            Some((diameter, length)) => (Some(diameter), Some(length)),
            None => {
                issues.push(ImportIssue::error(
                    Some(self.row_number),
                    Some("dimension"),
                    format!("cannot read '{}' as diameter x length", raw),
                ));
                (None, None)
            }
        }
    }

    pub fn flag(&self, aliases: &[&str]) -> bool {
        self.get(aliases).map(DataCleaner::parse_flag).unwrap_or(false)
    }

    /// Article is the order key; a row without one is dropped
    pub fn article(&self, aliases: &[&str], issues: &mut Vec<ImportIssue>) -> Option<String> {
        let article = self.text(aliases);
        if article.is_none() {
            issues.push(ImportIssue::error(
                Some(self.row_number),
                Some("article"),
                "article is missing",
            ));
        }
        article
    }
}

// ==========================================
// ImportStrategy
// ==========================================
pub trait ImportStrategy: Send + Sync {
    /// Customer code the layout belongs to
    fn code(&self) -> &'static str;

    fn columns(&self) -> &'static [ColumnSpec];

    /// Map one data row; issues go to `issues`, None drops the row
    fn map_row(&self, row: &SheetRow, issues: &mut Vec<ImportIssue>) -> Option<ImportRow>;

    /// Legacy layouts reference specifications that no longer exist
    fn allows_unknown_specification(&self) -> bool {
        false
    }

    /// Parse a whole sheet. Never fails: problems are collected as
    /// errors / warnings for the caller to decide on.
    fn parse(&self, sheet: &RawSheet, preview_rows: usize) -> ParseOutcome {
        let headers = HeaderNormalizer::normalize(&sheet.headers);
        let missing: Vec<String> = self
            .columns()
            .iter()
            .filter(|c| c.required && !c.aliases.iter().any(|a| headers.iter().any(|h| h == a)))
            .map(|c| c.field.to_string())
            .collect();
        if !missing.is_empty() {
            let error = ImportError::MissingColumns { columns: missing };
            return ParseOutcome {
                errors: vec![ImportIssue::error(None, None, error.to_string())],
                ..ParseOutcome::default()
            };
        }

        let mut rows = Vec::with_capacity(sheet.rows.len());
        let mut issues = Vec::new();
        for (idx, values) in sheet.rows.iter().enumerate() {
            let row = SheetRow::new(idx + 1, &headers, values);
            if let Some(mapped) = self.map_row(&row, &mut issues) {
                rows.push(mapped);
            }
        }

        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|issue| issue.level == IssueLevel::Error);
        ParseOutcome {
            preview: build_preview(&rows, preview_rows),
            rows,
            errors,
            warnings,
        }
    }
}

/// Tabular rendering of the first `limit` canonical rows
pub fn build_preview(rows: &[ImportRow], limit: usize) -> ImportPreview {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    let dec = |v: &Option<Decimal>| v.map(|d| d.normalize().to_string()).unwrap_or_default();
    ImportPreview {
        columns: PREVIEW_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .take(limit)
            .map(|r| {
                vec![
                    r.row_number.to_string(),
                    r.article.clone(),
                    opt(&r.batch),
                    dec(&r.diameter),
                    dec(&r.length),
                    opt(&r.specification_name),
                    opt(&r.head_type_name),
                    dec(&r.net_weight),
                    dec(&r.tare_weight),
                    r.quantity.map(|q| q.to_string()).unwrap_or_default(),
                    r.priority.to_string(),
                    if r.phosphate { "x" } else { "" }.to_string(),
                ]
            })
            .collect(),
    }
}

// ==========================================
// StrategyRegistry
// ==========================================
pub struct StrategyRegistry {
    strategies: HashMap<String, Box<dyn ImportStrategy>>,
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    pub fn register(&mut self, strategy: Box<dyn ImportStrategy>) {
        self.strategies.insert(strategy.code().to_string(), strategy);
    }

    pub fn get(&self, customer_code: &str) -> ImportResult<&dyn ImportStrategy> {
        let code = customer_code.trim().to_uppercase();
        self.strategies
            .get(&code)
            .map(|s| s.as_ref())
            .ok_or(ImportError::UnknownFormat(code))
    }

    pub fn codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(EurStrategy));
        registry.register(Box::new(SpxStrategy));
        registry.register(Box::new(RchStrategy));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.codes(), vec!["EUR", "RCH", "SPX"]);
        assert_eq!(registry.get(" eur ").unwrap().code(), "EUR");
        assert!(matches!(
            registry.get("XYZ"),
            Err(ImportError::UnknownFormat(code)) if code == "XYZ"
        ));
    }

    #[test]
    fn test_sheet_row_alias_lookup() {
        let headers = vec!["artikel".to_string(), "article".to_string()];
        let values = vec!["  ".to_string(), "A-7".to_string()];
        let row = SheetRow::new(3, &headers, &values);
        assert_eq!(row.get(&["artikel", "article"]), Some("A-7"));
        assert_eq!(row.get(&["missing"]), None);
    }
}
