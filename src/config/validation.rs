use crate::config::types::{Config, RetryConfig, SiteConfig, ThrottleConfig};
use crate::output::{Template, AD_FIELDS, RUN_DATE_FIELDS};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Upper bound for `retry.max-retries`
const MAX_RETRIES_LIMIT: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_throttle_config(&config.throttle)?;
    validate_retry_config(&config.retry)?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    validate_template("template", &config.template, AD_FIELDS)?;
    validate_template("ad-name-template", &config.ad_name_template, AD_FIELDS)?;
    validate_template("outdir", &config.outdir, RUN_DATE_FIELDS)?;

    Ok(())
}

/// Validates the marketplace endpoints
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if !config.listing_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "listing-path must start with '/', got '{}'",
            config.listing_path
        )));
    }

    Ok(())
}

fn validate_throttle_config(config: &ThrottleConfig) -> ConfigResult<()> {
    if config.min_ms > config.max_ms {
        return Err(ConfigError::Validation(format!(
            "throttle min-ms ({}) must not exceed max-ms ({})",
            config.min_ms, config.max_ms
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> ConfigResult<()> {
    if config.max_retries > MAX_RETRIES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= {}, got {}",
            MAX_RETRIES_LIMIT, config.max_retries
        )));
    }

    Ok(())
}

/// Parses a template and checks it only uses the allowed fields
fn validate_template(name: &'static str, source: &str, allowed: &[&str]) -> ConfigResult<()> {
    Template::parse(source)
        .and_then(|template| template.check_fields(allowed))
        .map_err(|source| ConfigError::Template { name, source })
}
