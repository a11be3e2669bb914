//! Assertions over the CLI's JSON output.

use anyhow::{Context, Result};
use serde_json::Value;

/// Assert a counter inside a breakdown object, e.g. `("latest", "failed")`.
pub fn assert_count(json: &Value, scope: &str, field: &str, expected: u64) -> Result<()> {
    let actual = json[scope][field]
        .as_u64()
        .with_context(|| format!("Expected numeric '{}.{}' in JSON", scope, field))?;

    if actual != expected {
        anyhow::bail!("Expected {}.{} = {}, got {}", scope, field, expected, actual);
    }
    Ok(())
}

/// Assert the number of rows in a `results` listing.
pub fn assert_row_count(json: &Value, expected: usize) -> Result<()> {
    let rows = json["rows"]
        .as_array()
        .context("Expected 'rows' array in JSON")?;

    if rows.len() != expected {
        anyhow::bail!("Expected {} rows, got {}", expected, rows.len());
    }
    Ok(())
}

/// Assert that exactly one row per test id is marked primary.
pub fn assert_one_primary_per_test(json: &Value) -> Result<()> {
    let rows = json["rows"]
        .as_array()
        .context("Expected 'rows' array in JSON")?;

    let mut seen = std::collections::BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        let test_id = row["test_id"]
            .as_i64()
            .with_context(|| format!("Row {} missing test_id", i))?;
        let primary = row["primary"]
            .as_bool()
            .with_context(|| format!("Row {} missing primary", i))?;
        *seen.entry(test_id).or_insert(0) += usize::from(primary);
    }

    for (test_id, primaries) in seen {
        if primaries != 1 {
            anyhow::bail!("Test {} has {} primary rows", test_id, primaries);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assert_count() {
        let json = json!({ "latest": { "failed": 2 } });
        assert!(assert_count(&json, "latest", "failed", 2).is_ok());
        assert!(assert_count(&json, "latest", "failed", 1).is_err());
        assert!(assert_count(&json, "all", "failed", 2).is_err());
    }

    #[test]
    fn test_assert_one_primary_per_test() {
        let json = json!({
            "rows": [
                { "test_id": 5, "primary": true },
                { "test_id": 5, "primary": false },
                { "test_id": 10, "primary": true }
            ]
        });
        assert!(assert_one_primary_per_test(&json).is_ok());
        assert!(assert_row_count(&json, 3).is_ok());

        let broken = json!({ "rows": [ { "test_id": 5, "primary": false } ] });
        assert!(assert_one_primary_per_test(&broken).is_err());
    }
}
