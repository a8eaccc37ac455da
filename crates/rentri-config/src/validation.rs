// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use std::collections::HashSet;

use url::Url;

use crate::diagnostic::ConfigError;
use crate::model::RentriConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validates a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &RentriConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    match Url::parse(&config.api.base_url) {
        Ok(url) => {
            let local = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
            if url.scheme() != "https" && !(url.scheme() == "http" && local) {
                invalid(format!(
                    "api.base_url must use https (plain http is only accepted for localhost), got `{}`",
                    config.api.base_url
                ));
            }
            if url.cannot_be_a_base() {
                invalid(format!(
                    "api.base_url `{}` cannot be used as a base URL",
                    config.api.base_url
                ));
            }
        }
        Err(e) => invalid(format!(
            "api.base_url `{}` is not a valid URL: {e}",
            config.api.base_url
        )),
    }

    if config.api.audience.trim().is_empty() {
        invalid("api.audience must not be empty".to_string());
    }
    if config.api.request_timeout_secs == 0 {
        invalid("api.request_timeout_secs must be at least 1".to_string());
    }
    if !(1..=100).contains(&config.api.page_size) {
        invalid(format!(
            "api.page_size must be between 1 and 100, got {}",
            config.api.page_size
        ));
    }

    if config.rate_limit.max_requests == 0 {
        invalid("rate_limit.max_requests must be at least 1".to_string());
    }
    if config.rate_limit.window_ms == 0 {
        invalid("rate_limit.window_ms must be at least 1".to_string());
    }

    if config.probe.timeout_secs == 0 {
        invalid("probe.timeout_secs must be at least 1".to_string());
    }
    if config.probe.services.is_empty() {
        invalid("probe.services must list at least one service".to_string());
    }
    let mut seen = HashSet::new();
    for (i, service) in config.probe.services.iter().enumerate() {
        if service.trim().is_empty() || service.contains('/') {
            invalid(format!(
                "probe.services[{i}] `{service}` must be a non-empty path segment"
            ));
        } else if !seen.insert(service.as_str()) {
            invalid(format!("probe.services[{i}] `{service}` is listed twice"));
        }
    }

    if let Some(path) = &config.credential.bundle_path
        && path.trim().is_empty()
    {
        invalid("credential.bundle_path must not be empty when set".to_string());
    }
    if let Some(code) = &config.credential.fiscal_code
        && code.trim().is_empty()
    {
        invalid("credential.fiscal_code must not be empty when set".to_string());
    }

    if config.workflow.output_dir.trim().is_empty() {
        invalid("workflow.output_dir must not be empty".to_string());
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        invalid(format!(
            "logging.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.logging.level
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
