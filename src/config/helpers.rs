use std::str::FromStr;

use crate::error::ConfigError;

/// Read an env var, treating an empty value as unset.
pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("failed to read: {e}"),
        }),
    }
}

/// Parse an env var into `T`, falling back to `default` when unset.
pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|v| v.unwrap_or(default))
}

/// Parse a boolean env var (`true`/`false`).
pub(crate) fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    optional_env(key)?
        .map(|s| s.trim().to_lowercase().parse())
        .transpose()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("must be 'true' or 'false': {e}"),
        })
        .map(|v| v.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_var_falls_back_to_default() {
        let port: u16 = parse_optional_env("LEANRAG_TEST_HELPERS_UNSET_PORT", 4321).unwrap();
        assert_eq!(port, 4321);
        assert!(!parse_bool_env("LEANRAG_TEST_HELPERS_UNSET_BOOL", false).unwrap());
    }

    #[test]
    fn invalid_number_is_rejected() {
        // SAFETY: the key is unique to this test.
        unsafe {
            std::env::set_var("LEANRAG_TEST_HELPERS_BAD_PORT", "not-a-port");
        }
        let result: Result<u16, _> = parse_optional_env("LEANRAG_TEST_HELPERS_BAD_PORT", 1);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        // SAFETY: the key is unique to this test.
        unsafe {
            std::env::remove_var("LEANRAG_TEST_HELPERS_BAD_PORT");
        }
    }

    #[test]
    fn empty_value_is_unset() {
        // SAFETY: the key is unique to this test.
        unsafe {
            std::env::set_var("LEANRAG_TEST_HELPERS_EMPTY", "  ");
        }
        assert_eq!(optional_env("LEANRAG_TEST_HELPERS_EMPTY").unwrap(), None);
        // SAFETY: the key is unique to this test.
        unsafe {
            std::env::remove_var("LEANRAG_TEST_HELPERS_EMPTY");
        }
    }
}
