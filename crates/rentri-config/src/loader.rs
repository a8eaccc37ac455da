// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./rentri.toml` > `~/.config/rentri/rentri.toml` >
//! `/etc/rentri/rentri.toml`, with `RENTRI_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RentriConfig;

/// Top-level sections, used to map `RENTRI_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &[
    "rate_limit",
    "credential",
    "workflow",
    "logging",
    "probe",
    "api",
];

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rentri/rentri.toml`
/// 3. `~/.config/rentri/rentri.toml`
/// 4. `./rentri.toml`
/// 5. `RENTRI_*` environment variables
pub fn load_config() -> Result<RentriConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<RentriConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RentriConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RentriConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RentriConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(RentriConfig::default()))
        .merge(Toml::file("/etc/rentri/rentri.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("rentri/rentri.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("rentri.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `RENTRI_RATE_LIMIT_MAX_REQUESTS` into
/// `rate.limit.max.requests`; only the section boundary becomes a dot.
fn env_provider() -> Env {
    Env::prefixed("RENTRI_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env key onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_only_at_section_boundary() {
        assert_eq!(
            map_env_key("rate_limit_max_requests"),
            "rate_limit.max_requests"
        );
        assert_eq!(
            map_env_key("credential_bundle_path"),
            "credential.bundle_path"
        );
        assert_eq!(map_env_key("api_base_url"), "api.base_url");
        assert_eq!(
            map_env_key("workflow_issue_interval_ms"),
            "workflow.issue_interval_ms"
        );
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("something_else"), "something_else");
        assert_eq!(map_env_key("apiary"), "apiary");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("rentri.toml", "[api]\npage_size = 50\n")?;
            jail.set_env("RENTRI_API_PAGE_SIZE", "25");
            jail.set_env("RENTRI_RATE_LIMIT_MAX_REQUESTS", "10");

            let config = load_config_from_path(Path::new("rentri.toml"))?;
            assert_eq!(config.api.page_size, 25);
            assert_eq!(config.rate_limit.max_requests, 10);
            Ok(())
        });
    }
}
