// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a typo in `rentri.toml`
//! is reported at startup instead of silently falling back to a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RentriConfig {
    /// Remote API endpoint and per-call behavior.
    #[serde(default)]
    pub api: ApiConfig,

    /// Client-side sliding-window rate limit.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Certificate bundle used for authentication.
    #[serde(default)]
    pub credential: CredentialConfig,

    /// Reachability and service status probes.
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Pacing of the issuance and batch workflows.
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the registry API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Audience claim placed in every token.
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Timeout applied to every authenticated call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pause before the single retry that follows an HTTP 429.
    #[serde(default = "default_throttle_cooldown_secs")]
    pub throttle_cooldown_secs: u64,

    /// Items requested per page on paginated listings (max 100).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            audience: default_audience(),
            request_timeout_secs: default_request_timeout_secs(),
            throttle_cooldown_secs: default_throttle_cooldown_secs(),
            page_size: default_page_size(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn throttle_cooldown(&self) -> Duration {
        Duration::from_secs(self.throttle_cooldown_secs)
    }
}

fn default_base_url() -> String {
    "https://api.rentri.gov.it".to_string()
}

fn default_audience() -> String {
    "rentrigov.api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_throttle_cooldown_secs() -> u64 {
    10
}

fn default_page_size() -> usize {
    100
}

/// Sliding-window rate limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum requests inside one window.
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,

    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Extra wait added once the window is full.
    #[serde(default = "default_safety_margin_ms")]
    pub safety_margin_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
            safety_margin_ms: default_safety_margin_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_millis(self.safety_margin_ms)
    }
}

fn default_max_requests() -> usize {
    90
}

fn default_window_ms() -> u64 {
    5_000
}

fn default_safety_margin_ms() -> u64 {
    50
}

/// Certificate bundle configuration.
///
/// Every field is optional: the CLI prompts for a missing passphrase and
/// rejects a missing bundle path or fiscal code before any network call.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    /// Path to the PKCS#12 (.p12 / .pfx) bundle.
    #[serde(default)]
    pub bundle_path: Option<String>,

    /// Bundle passphrase. Prefer the `RENTRI_CREDENTIAL_PASSPHRASE` env var.
    #[serde(default)]
    pub passphrase: Option<String>,

    /// Fiscal code of the certificate holder, used as token issuer and subject.
    #[serde(default)]
    pub fiscal_code: Option<String>,
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// Timeout for each probe request and for the TCP connect.
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra HTTP attempts after the first one fails.
    #[serde(default = "default_probe_retries")]
    pub retries: u32,

    /// Sub-services whose `<name>/v1.0/status` endpoint is polled.
    #[serde(default = "default_services")]
    pub services: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout_secs(),
            retries: default_probe_retries(),
            services: default_services(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_probe_retries() -> u32 {
    1
}

fn default_services() -> Vec<String> {
    [
        "formulari",
        "vidimazione-formulari",
        "dati-registri",
        "codifiche",
        "ca-rentri",
        "anagrafiche",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Workflow pacing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Pause between consecutive issuance calls.
    #[serde(default = "default_issue_interval_ms")]
    pub issue_interval_ms: u64,

    /// Wait after issuing for the registry to list the new documents.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause between consecutive rendered-file downloads.
    #[serde(default = "default_download_interval_ms")]
    pub download_interval_ms: u64,

    /// Pause between consecutive void calls in a batch.
    #[serde(default = "default_void_interval_ms")]
    pub void_interval_ms: u64,

    /// Default destination directory for downloaded files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            issue_interval_ms: default_issue_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            download_interval_ms: default_download_interval_ms(),
            void_interval_ms: default_void_interval_ms(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_issue_interval_ms() -> u64 {
    2_000
}

fn default_settle_delay_ms() -> u64 {
    8_000
}

fn default_download_interval_ms() -> u64 {
    1_000
}

fn default_void_interval_ms() -> u64 {
    500
}

fn default_output_dir() -> String {
    ".".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
