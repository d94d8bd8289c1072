//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Supports:
/// - `${VAR}` - expands to the value of VAR, errors if unset
/// - `${VAR:-default}` - expands to VAR if set, otherwise uses default
///
/// Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let mut missing = Vec::new();
    let expanded = shellexpand::env_with_context(value, |var| -> Result<Option<String>, NoError> {
        if let Ok(val) = std::env::var(var) {
            return Ok(Some(val));
        }
        missing.push(var.to_owned());
        Ok(None)
    })
    .map_or_else(|_| value.to_owned(), std::borrow::Cow::into_owned);

    // Unset variables without a default are left in place by shellexpand.
    if let Some(var) = missing
        .iter()
        .find(|var| expanded.contains(&format!("${{{var}}}")))
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{var}}} not set"),
        });
    }
    Ok(expanded)
}

/// Lookup never fails; unset variables are reported as `None`.
#[derive(Debug)]
enum NoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("BF_TEST_VAR_SIMPLE", "/var/cache");
        }
        let result = expand_env("${BF_TEST_VAR_SIMPLE}", "cache.dir").unwrap();
        assert_eq!(result, "/var/cache");
        unsafe {
            std::env::remove_var("BF_TEST_VAR_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("BF_UNSET_VAR_TEST");
        }
        let result = expand_env("${BF_UNSET_VAR_TEST:-.befund/cache}", "cache.dir").unwrap();
        assert_eq!(result, ".befund/cache");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("BF_MISSING_VAR_TEST");
        }
        let err = expand_env("${BF_MISSING_VAR_TEST}/schemas", "cache.dir").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("BF_MISSING_VAR_TEST"));
        assert!(err.to_string().contains("cache.dir"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("BF_HOME_TEST", "/home/arzt");
        }
        let result = expand_env("${BF_HOME_TEST}/.befund", "cache.dir").unwrap();
        assert_eq!(result, "/home/arzt/.befund");
        unsafe {
            std::env::remove_var("BF_HOME_TEST");
        }
    }

    #[test]
    fn test_literal_and_bare_dollar_unchanged() {
        assert_eq!(expand_env("cache", "cache.dir").unwrap(), "cache");
        assert_eq!(expand_env("$VAR", "cache.dir").unwrap(), "$VAR");
    }
}
