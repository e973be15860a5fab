//! `kiln key`: prints the expanded cache key for a JSON-encoded key.

use kiln_cache::Cache;

/// Runs the `kiln key` command.
pub fn run(key: &str) -> Result<i32, Box<dyn std::error::Error>> {
    let value: serde_json::Value =
        serde_json::from_str(key).map_err(|e| format!("key is not valid JSON: {e}"))?;
    println!("{}", Cache::expand_key(&value)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_json_key() {
        assert_eq!(run(r#"{"b": 1, "a": [true, null]}"#).unwrap(), 0);
    }

    #[test]
    fn invalid_json_key() {
        let err = run("{not json").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }
}
