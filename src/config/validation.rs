use crate::config::types::{
    Config, DelayConfig, DriverConfig, DriverKind, HarvestConfig, OutputConfig, SearchConfig,
    SearchMode,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_harvest_config(&config.harvest)?;
    validate_driver_config(&config.driver)?;
    validate_delay_config(&config.delay)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.query.is_empty() {
        return Err(ConfigError::Validation(
            "search query cannot be empty".to_string(),
        ));
    }

    match config.mode {
        SearchMode::CustomUrl => {
            // In custom-url mode the query must itself be a valid URL
            Url::parse(&config.query).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid custom URL '{}': {}", config.query, e))
            })?;
        }
        SearchMode::Keyword | SearchMode::Category => {
            let url = Url::parse(&config.base_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "base-url must use HTTP or HTTPS scheme, got '{}'",
                    url.scheme()
                )));
            }
        }
    }

    Ok(())
}

/// Validates harvest configuration
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 32 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 32, got {}",
            config.workers
        )));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    // max_pages of 0 means unbounded, any other value is a hard cap
    Ok(())
}

/// Validates driver configuration
fn validate_driver_config(config: &DriverConfig) -> Result<(), ConfigError> {
    if config.kind == DriverKind::Cdp {
        if config.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "driver endpoint cannot be empty in cdp mode".to_string(),
            ));
        }

        Url::parse(&config.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid driver endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;
    }

    Ok(())
}

/// Validates delay configuration
fn validate_delay_config(config: &DelayConfig) -> Result<(), ConfigError> {
    if config.min_ms > config.max_ms {
        return Err(ConfigError::Validation(format!(
            "delay min-ms ({}) must not exceed max-ms ({})",
            config.min_ms, config.max_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.catalog_path.is_empty() {
        return Err(ConfigError::Validation(
            "catalog-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
