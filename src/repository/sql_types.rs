// ==========================================
// Bedna workflow - column codecs
// ==========================================
// Decimals live in TEXT columns, enums as SCREAMING_SNAKE_CASE text.
// Bad stored values surface as FromSqlConversionFailure.
// ==========================================

use crate::repository::error::RepositoryResult;
use rust_decimal::Decimal;
use rusqlite::types::Type;
use rusqlite::Row;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::str::FromStr;

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

pub(crate) fn decimal_col(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn enum_col<T>(row: &Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unknown value '{}'", raw)))
}

pub(crate) fn bool_col(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

/// JSON snapshot of an entity for the audit payload
pub(crate) fn snapshot<T: Serialize>(value: &T) -> RepositoryResult<JsonValue> {
    Ok(serde_json::to_value(value)?)
}
