//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// An unset `${VAR}` without a default is an error naming `field`.
/// Bare `$VAR` is left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| match std::env::var(var) {
        Ok(val) => Ok(Some(val)),
        Err(_) => Err(UnsetVar(var.to_owned())),
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Name of a referenced variable that is not set.
struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_token_from_env() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("PLUGDOCS_TEST_TOKEN", "ghp_secret");
        }
        let result = expand_env("${PLUGDOCS_TEST_TOKEN}", "github.token").unwrap();
        assert_eq!(result, "ghp_secret");
        unsafe {
            std::env::remove_var("PLUGDOCS_TEST_TOKEN");
        }
    }

    #[test]
    fn test_expand_empty_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("PLUGDOCS_UNSET_TOKEN");
        }
        let result = expand_env("${PLUGDOCS_UNSET_TOKEN:-}", "github.token").unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_expand_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("PLUGDOCS_MISSING_HOST");
        }
        let err = expand_env("${PLUGDOCS_MISSING_HOST}", "server.host").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("PLUGDOCS_MISSING_HOST"));
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_expand_embedded_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("PLUGDOCS_GHE_HOST", "git.example.com");
        }
        let result = expand_env("https://${PLUGDOCS_GHE_HOST}/api/v3", "github.api_url").unwrap();
        assert_eq!(result, "https://git.example.com/api/v3");
        unsafe {
            std::env::remove_var("PLUGDOCS_GHE_HOST");
        }
    }

    #[test]
    fn test_literal_and_bare_dollar_unchanged() {
        assert_eq!(expand_env("127.0.0.1", "server.host").unwrap(), "127.0.0.1");
        assert_eq!(expand_env("$HOME", "server.host").unwrap(), "$HOME");
    }
}
