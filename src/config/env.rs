/// Read an env var as a trimmed, non-empty string.
pub fn parse_string_env(key: &str) -> Option<String> {
    let val = std::env::var(key).ok()?;
    let trimmed = val.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read an env var as a `u64`. Unparseable values are ignored with a warning.
pub fn parse_u64_env(key: &str) -> Option<u64> {
    let raw = parse_string_env(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, "ignoring non-numeric env override");
            None
        }
    }
}
