//! Shared utility functions used across the codebase.

/// Parse an environment variable as a boolean, returning `default` if unset.
///
/// Recognises `1`, `true`, `yes`, `y`, `on` (case-insensitive) as `true`;
/// everything else maps to `false`. Unset maps to `default`.
pub fn env_var_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

/// Read an environment variable, treating unset and blank values the same.
pub fn env_var_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Split a whitespace-separated argument string into individual arguments.
pub fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "y", "On"] {
            assert!(parse_bool(value), "{value:?} should parse as true");
        }
    }

    #[test]
    fn parse_bool_rejects_everything_else() {
        for value in ["0", "false", "no", "", "maybe"] {
            assert!(!parse_bool(value), "{value:?} should parse as false");
        }
    }

    #[test]
    fn env_var_bool_falls_back_when_unset() {
        assert!(env_var_bool("ROOTCHECK_TEST_SURELY_UNSET_BOOL", true));
        assert!(!env_var_bool("ROOTCHECK_TEST_SURELY_UNSET_BOOL", false));
    }

    #[test]
    fn env_var_trimmed_ignores_blank_values() {
        std::env::set_var("ROOTCHECK_TEST_BLANK_VALUE", "   ");
        assert_eq!(env_var_trimmed("ROOTCHECK_TEST_BLANK_VALUE"), None);
        std::env::set_var("ROOTCHECK_TEST_PADDED_VALUE", "  value ");
        assert_eq!(
            env_var_trimmed("ROOTCHECK_TEST_PADDED_VALUE").as_deref(),
            Some("value")
        );
    }

    #[test]
    fn split_args_drops_extra_whitespace() {
        assert_eq!(split_args("  --json   -v "), vec!["--json", "-v"]);
        assert!(split_args("").is_empty());
    }
}
