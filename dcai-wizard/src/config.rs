//! Configuration resolution for dcai-wizard
//!
//! Provides multi-tier backend-URL resolution with CLI → ENV → TOML priority.

use dcai_common::config::load_toml_config;
use tracing::{info, warn};

/// Environment variable naming the backend origin
pub const BACKEND_URL_ENV: &str = "DCAI_BACKEND_URL";

/// Unprefixed fallback variable, honored for deployments that configure the
/// upstream origin service-agnostically
pub const BACKEND_URL_ENV_FALLBACK: &str = "BACKEND_URL";

/// Resolve the backend base URL from 3-tier configuration.
///
/// **Priority:** CLI argument → environment → TOML config.
///
/// Returns `None` when no tier provides a value; proxy routes then answer
/// with an explicit configuration error instead of a generic network
/// failure.
pub fn resolve_backend_url(cli_arg: Option<String>) -> Option<String> {
    let cli_url = cli_arg.filter(|url| is_valid_value(url));
    let env_url = std::env::var(BACKEND_URL_ENV)
        .or_else(|_| std::env::var(BACKEND_URL_ENV_FALLBACK))
        .ok()
        .filter(|url| is_valid_value(url));
    let toml_url = load_toml_config()
        .ok()
        .and_then(|config| config.backend_url)
        .filter(|url| is_valid_value(url));

    let mut sources = Vec::new();
    if cli_url.is_some() {
        sources.push("command line");
    }
    if env_url.is_some() {
        sources.push("environment");
    }
    if toml_url.is_some() {
        sources.push("TOML");
    }
    if sources.len() > 1 {
        warn!(
            "Backend URL found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(url) = cli_url {
        info!("Backend URL loaded from command line");
        return Some(url);
    }
    if let Some(url) = env_url {
        info!("Backend URL loaded from environment variable");
        return Some(url);
    }
    if let Some(url) = toml_url {
        info!("Backend URL loaded from TOML config");
        return Some(url);
    }

    warn!(
        "Backend URL not configured; proxy routes will return configuration errors. \
         Set {} or backend_url in the TOML config.",
        BACKEND_URL_ENV
    );
    None
}

/// Validate a configuration value (non-empty, non-whitespace)
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn cli_argument_has_highest_priority() {
        std::env::set_var(BACKEND_URL_ENV, "http://from-env");

        let url = resolve_backend_url(Some("http://from-cli".to_string()));

        assert_eq!(url.as_deref(), Some("http://from-cli"));
        std::env::remove_var(BACKEND_URL_ENV);
    }

    #[test]
    #[serial]
    fn environment_used_without_cli_argument() {
        std::env::set_var(BACKEND_URL_ENV, "http://from-env");

        let url = resolve_backend_url(None);

        assert_eq!(url.as_deref(), Some("http://from-env"));
        std::env::remove_var(BACKEND_URL_ENV);
    }

    #[test]
    #[serial]
    fn unprefixed_environment_variable_is_honored() {
        std::env::remove_var(BACKEND_URL_ENV);
        std::env::set_var(BACKEND_URL_ENV_FALLBACK, "http://from-plain-env");

        let url = resolve_backend_url(None);

        assert_eq!(url.as_deref(), Some("http://from-plain-env"));
        std::env::remove_var(BACKEND_URL_ENV_FALLBACK);
    }

    #[test]
    #[serial]
    fn blank_values_do_not_count_as_configured() {
        std::env::remove_var(BACKEND_URL_ENV);
        std::env::remove_var(BACKEND_URL_ENV_FALLBACK);

        let url = resolve_backend_url(Some("   ".to_string()));

        assert!(url.is_none());
    }

    #[test]
    fn validity_check_rejects_whitespace() {
        assert!(is_valid_value("http://backend"));
        assert!(!is_valid_value(""));
        assert!(!is_valid_value("  "));
    }
}
