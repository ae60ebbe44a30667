//! CSV record reader for bulk imports.
//!
//! The header row names the properties; every following row becomes one
//! object whose property values are the row's cells as strings.

use serde_json::{Map, Value};
use teammate_core::error::VectorStoreError;

/// Parse CSV bytes into property maps, one per data row.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Map<String, Value>>, VectorStoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| VectorStoreError::Csv(e.to_string()))?
        .clone();

    if headers.is_empty() {
        return Err(VectorStoreError::Csv("missing header row".into()));
    }

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| VectorStoreError::Csv(format!("row {}: {e}", line + 1)))?;
        let object: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, cell)| (name.to_string(), Value::String(cell.to_string())))
            .collect();
        records.push(object);
    }

    Ok(records)
}
