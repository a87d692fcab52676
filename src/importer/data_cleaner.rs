// ==========================================
// Bedna workflow - data cleaner
// ==========================================
// Tolerant cell parsing shared by every customer strategy:
// TRIM / NULL normalization, decimal commas, "d x l" dimensions,
// keyword flags.
// ==========================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

const TRUE_FLAGS: &[&str] = &["x", "1", "ja", "j", "yes", "y", "true", "ano"];

pub struct DataCleaner;

impl DataCleaner {
    /// Trimmed text, None when blank
    pub fn clean_text(value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Decimal from spreadsheet text
    ///
    /// Accepts `12.5`, `12,5`, `1.234,5`, `1 234,5` and a trailing
    /// `kg` / `mm` unit. When both separators occur, the last one is
    /// the decimal separator.
    pub fn parse_decimal(value: &str) -> Option<Decimal> {
        let lowered = value.trim().to_lowercase();
        let stripped = lowered
            .trim_end_matches("kg")
            .trim_end_matches("mm")
            .trim();
        let compact: String = stripped
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\'')
            .collect();
        if compact.is_empty() {
            return None;
        }

        let normalized = match (compact.rfind(','), compact.rfind('.')) {
            (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => compact.replace(',', ""),
            (Some(_), None) => compact.replace(',', "."),
            _ => compact,
        };
        Decimal::from_str(&normalized).ok()
    }

    /// Whole positive piece count; `12,0` is accepted, `12,5` is not
    pub fn parse_quantity(value: &str) -> Option<i64> {
        let d = Self::parse_decimal(value)?;
        if d.fract().is_zero() && d > Decimal::ZERO {
            d.to_i64()
        } else {
            None
        }
    }

    /// Split a combined "diameter x length" cell
    ///
    /// Separators: `x`, `X`, `×`, optional spaces; a leading thread
    /// designation `M` is ignored (`M8x120`).
    pub fn split_dimension(value: &str) -> Option<(Decimal, Decimal)> {
        let lowered = value.trim().to_lowercase().replace('×', "x");
        let (diameter, length) = lowered.split_once('x')?;
        let diameter = Self::parse_decimal(diameter.trim().trim_start_matches('m'))?;
        let length = Self::parse_decimal(length)?;
        if diameter <= Decimal::ZERO || length <= Decimal::ZERO {
            return None;
        }
        Some((diameter, length))
    }

    /// Case-insensitive substring match of any keyword
    pub fn contains_keyword(text: Option<&str>, keywords: &[&str]) -> bool {
        match text {
            Some(t) => {
                let lowered = t.to_lowercase();
                keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
            }
            None => false,
        }
    }

    /// Checkbox-like cell ("x", "ja", "1", ...)
    pub fn parse_flag(value: &str) -> bool {
        let lowered = value.trim().to_lowercase();
        TRUE_FLAGS.contains(&lowered.as_str())
    }
}
