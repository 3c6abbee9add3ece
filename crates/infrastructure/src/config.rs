//! Environment configuration loader.

use std::time::Duration;

use payql_domain::{Credentials, DomainError, DomainResult, SdkConfig};

/// GraphQL endpoint URL.
pub const ENV_ENDPOINT: &str = "PAYQL_ENDPOINT";
/// OAuth2 token endpoint URL.
pub const ENV_TOKEN_ENDPOINT: &str = "PAYQL_TOKEN_ENDPOINT";
/// OAuth2 client id.
pub const ENV_CLIENT_ID: &str = "PAYQL_CLIENT_ID";
/// OAuth2 client secret.
pub const ENV_CLIENT_SECRET: &str = "PAYQL_CLIENT_SECRET";
/// GraphQL request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "PAYQL_TIMEOUT_SECS";
/// Token request retries.
pub const ENV_MAX_RETRIES: &str = "PAYQL_MAX_RETRIES";

/// Builds a validated [`SdkConfig`] from `PAYQL_*` environment variables.
///
/// # Errors
///
/// Returns a `DomainError` when a required variable is missing, a numeric
/// variable does not parse, or the resulting configuration is invalid.
pub fn config_from_env() -> DomainResult<SdkConfig> {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Same as [`config_from_env`] with a custom variable source.
///
/// # Errors
///
/// See [`config_from_env`].
pub fn config_from_lookup<F>(lookup: F) -> DomainResult<SdkConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
    let require = |name: &'static str| get(name).ok_or(DomainError::MissingField(name));

    let credentials = Credentials::new(require(ENV_CLIENT_ID)?, require(ENV_CLIENT_SECRET)?);
    let mut config = SdkConfig::new(require(ENV_ENDPOINT)?, credentials);

    if let Some(token_endpoint) = get(ENV_TOKEN_ENDPOINT) {
        config = config.with_token_endpoint(token_endpoint);
    }
    if let Some(raw) = get(ENV_TIMEOUT_SECS) {
        config = config.with_timeout(Duration::from_secs(parse_number(ENV_TIMEOUT_SECS, &raw)?));
    }
    if let Some(raw) = get(ENV_MAX_RETRIES) {
        config = config.with_max_retries(parse_number(ENV_MAX_RETRIES, &raw)?);
    }

    config.validate()?;
    Ok(config)
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> DomainResult<T> {
    raw.trim().parse().map_err(|_| DomainError::InvalidValue {
        field,
        message: format!("expected a non-negative integer, got {raw:?}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_ENDPOINT, "https://api.example.com/graphql"),
            (ENV_CLIENT_ID, "client"),
            (ENV_CLIENT_SECRET, "secret"),
        ]
    }

    #[test]
    fn test_minimal_environment_uses_defaults() {
        let config = config_from_lookup(lookup(&base())).unwrap();

        assert_eq!(config.endpoint, "https://api.example.com/graphql");
        assert_eq!(config.token_endpoint, None);
        assert_eq!(config.credentials, Credentials::new("client", "secret"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_optional_variables() {
        let mut vars = base();
        vars.push((ENV_TOKEN_ENDPOINT, "https://auth.example.com/token"));
        vars.push((ENV_TIMEOUT_SECS, "5"));
        vars.push((ENV_MAX_RETRIES, " 0 "));

        let config = config_from_lookup(lookup(&vars)).unwrap();

        assert_eq!(
            config.token_endpoint.as_deref(),
            Some("https://auth.example.com/token")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_missing_and_blank_variables() {
        let err = config_from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, DomainError::MissingField(ENV_CLIENT_ID));

        let mut vars = base();
        vars.retain(|(k, _)| *k != ENV_CLIENT_SECRET);
        vars.push((ENV_CLIENT_SECRET, "   "));
        let err = config_from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, DomainError::MissingField(ENV_CLIENT_SECRET));
    }

    #[test]
    fn test_invalid_numbers_and_urls() {
        let mut vars = base();
        vars.push((ENV_MAX_RETRIES, "-1"));
        let err = config_from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidValue {
                field: ENV_MAX_RETRIES,
                ..
            }
        ));

        let mut vars = base();
        vars.push((ENV_TOKEN_ENDPOINT, "ftp://auth.example.com"));
        let err = config_from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidUrl { .. }));
    }
}
