use crate::config::types::{ApiConfig, Config, CrawlerConfig, OrderingConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_sites(&config.sites)?;
    validate_crawler_config(&config.crawler)?;
    validate_api_config(&config.api)?;
    validate_output_config(&config.output)?;
    validate_ordering_config(&config.ordering)?;
    Ok(())
}

/// Validates the site list
fn validate_sites(sites: &[String]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one site must be configured".to_string(),
        ));
    }

    for site in sites {
        validate_site_name(site)?;
    }

    Ok(())
}

/// Validates a wiki site name (the subdomain part of its URL)
fn validate_site_name(site: &str) -> Result<(), ConfigError> {
    if site.is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    if !site
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "site '{}' must contain only lowercase letters, digits and hyphens",
            site
        )));
    }

    if site.starts_with('-') || site.ends_with('-') {
        return Err(ConfigError::Validation(format!(
            "site '{}' cannot start or end with '-'",
            site
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_every must be >= 1".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1".to_string(),
        ));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    Ok(())
}

/// Validates API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.state_path.is_empty() {
        return Err(ConfigError::Validation(
            "state_path cannot be empty".to_string(),
        ));
    }

    if config.report_path.is_empty() {
        return Err(ConfigError::Validation(
            "report_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates ordering configuration
fn validate_ordering_config(config: &OrderingConfig) -> Result<(), ConfigError> {
    if config.numbered_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "numbered_prefix cannot be empty".to_string(),
        ));
    }

    if config.pad_width < 1 || config.pad_width > 20 {
        return Err(ConfigError::Validation(format!(
            "pad_width must be between 1 and 20, got {}",
            config.pad_width
        )));
    }

    if config.alias_prefixes.iter().any(String::is_empty) {
        return Err(ConfigError::Validation(
            "alias prefixes cannot be empty".to_string(),
        ));
    }

    Ok(())
}
