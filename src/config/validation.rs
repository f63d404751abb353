use crate::config::types::{Config, CrawlerConfig, ParamsConfig, ScopeConfig, UserAgentConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_scope_config(&config.scope)?;
    validate_params_config(&config.params)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed_url, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            config.seed_url
        )));
    }

    if seed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            config.seed_url
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates scope rules: the prefix shape and that every rule compiles
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    if !config.language_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "language_prefix must start with '/', got '{}'",
            config.language_prefix
        )));
    }

    if config.allow.is_empty() {
        return Err(ConfigError::Validation(
            "scope.allow must contain at least one rule".to_string(),
        ));
    }

    for pattern in config.allow.iter().chain(config.deny.iter()) {
        validate_rule(pattern)?;
    }

    Ok(())
}

/// Validates query parameter lists
fn validate_params_config(config: &ParamsConfig) -> Result<(), ConfigError> {
    for pattern in &config.tracking {
        let literal = pattern.strip_suffix('*').unwrap_or(pattern);
        if literal.is_empty() || literal.contains('*') {
            return Err(ConfigError::InvalidPattern(format!(
                "Tracking parameter pattern '{}' must be a name with an optional trailing '*'",
                pattern
            )));
        }
    }

    if let Some(empty) = config.stable.iter().find(|name| name.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "Stable parameter names cannot be empty: {:?}",
            empty
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.summary_file.is_empty() {
        return Err(ConfigError::Validation(
            "summary_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_rule(pattern: &str) -> Result<(), ConfigError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}
