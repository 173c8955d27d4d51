//! JSON notation: a direct structural dump of the table list.
//!
//! Unlike the DBML side there is no name-based identity merge here — the dump
//! serializes entity ids, so replacing the table list wholesale already
//! preserves identity for unchanged input.

use crate::model::Table;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    /// The input did not have the expected top-level shape.
    #[error("expected a JSON array of tables")]
    NotAnArray,
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Serialize the table list as pretty-printed JSON.
pub fn tables_to_json(tables: &[Table]) -> Result<String, JsonError> {
    Ok(serde_json::to_string_pretty(tables)?)
}

/// Deserialize a table list. Shape validation is minimal: the top level must
/// be an array; beyond that the input is trusted.
pub fn tables_from_json(text: &str) -> Result<Vec<Table>, JsonError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_array() {
        return Err(JsonError::NotAnArray);
    }
    Ok(serde_json::from_value(value)?)
}
