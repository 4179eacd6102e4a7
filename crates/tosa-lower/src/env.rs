//! Switches read from the process environment once per process.

use std::env;
use std::sync::OnceLock;

const STRICT_LAYOUT_VAR: &str = "TOSA_LOWER_STRICT_LAYOUT";

pub(crate) fn strict_layout_enabled() -> bool {
    static STRICT_LAYOUT: OnceLock<bool> = OnceLock::new();
    *STRICT_LAYOUT.get_or_init(|| flag(STRICT_LAYOUT_VAR).unwrap_or(false))
}

/// Reads a boolean switch; unset, blank and unrecognised values yield `None`.
fn flag(var: &str) -> Option<bool> {
    let raw = env::var(var).ok()?;
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_flag(&raw);
    if parsed.is_none() {
        tracing::warn!(var, value = %raw, "ignoring unrecognised boolean switch");
    }
    parsed
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        for value in ["1", "true", " YES ", "On"] {
            assert_eq!(parse_flag(value), Some(true), "{value} should enable");
        }
        for value in ["0", "false", "No", "off "] {
            assert_eq!(parse_flag(value), Some(false), "{value} should disable");
        }
    }

    #[test]
    fn parse_flag_rejects_unknown_values() {
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }
}
