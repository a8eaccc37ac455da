// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unauthenticated reachability and per-service status probes.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use futures::future::join_all;
use rentri_core::{ReachabilityReport, RentriError, ServiceStatus};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// HTTP codes that prove the endpoint is up, even when they are errors.
const UP_CODES: &[u16] = &[200, 301, 302, 400, 401, 403, 404, 405];

/// Probe client with its own timeout, outside the rate limit.
#[derive(Debug, Clone)]
pub struct Prober {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    retries: u32,
    services: Vec<String>,
}

impl Prober {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retries: u32,
        services: Vec<String>,
    ) -> Result<Self, RentriError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RentriError::Config(format!("invalid base URL `{base_url}`: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RentriError::transport("failed to build probe client", e))?;
        Ok(Self {
            http,
            base_url,
            timeout,
            retries,
            services,
        })
    }

    pub fn from_config(config: &rentri_config::RentriConfig) -> Result<Self, RentriError> {
        Self::new(
            &config.api.base_url,
            config.probe.timeout(),
            config.probe.retries,
            config.probe.services.clone(),
        )
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    /// TCP connect to the base host, then HEAD (GET on transport failure).
    pub async fn check_reachability(&self) -> ReachabilityReport {
        let started = Instant::now();
        let mut notes = Vec::new();

        if let Err(e) = self.connect().await {
            return ReachabilityReport {
                reachable: false,
                http_code: None,
                latency_ms: None,
                note: format!("TCP_FAIL:{e}"),
            };
        }
        notes.push("TCP_OK".to_string());

        let mut http_code = None;
        for attempt in 0..=self.retries {
            match self.head_or_get().await {
                Ok(code) => {
                    http_code = Some(code);
                    break;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "probe request failed");
                    notes.push(format!("HTTP_RETRY:{e}"));
                }
            }
        }

        let reachable = http_code.is_some_and(|c| UP_CODES.contains(&c));
        if reachable {
            notes.push("HTTP_OK".to_string());
        } else {
            let code = http_code.map_or_else(|| "none".to_string(), |c| c.to_string());
            notes.push(format!("HTTP_CODE:{code}"));
        }

        ReachabilityReport {
            reachable,
            http_code,
            latency_ms: Some(elapsed_ms(started)),
            note: notes.join(","),
        }
    }

    async fn connect(&self) -> Result<(), String> {
        let host = self
            .base_url
            .host_str()
            .ok_or_else(|| "base URL has no host".to_string())?;
        let port = self
            .base_url
            .port_or_known_default()
            .ok_or_else(|| "base URL has no port".to_string())?;

        match tokio::time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("connect timed out after {:?}", self.timeout)),
        }
    }

    async fn head_or_get(&self) -> Result<u16, reqwest::Error> {
        let response = match self.http.head(self.base_url.clone()).send().await {
            Ok(response) => response,
            Err(_) => self.http.get(self.base_url.clone()).send().await?,
        };
        Ok(response.status().as_u16())
    }

    /// Polls `<base>/<service>/v1.0/status` for every configured service.
    ///
    /// Probes run concurrently and fail independently.
    pub async fn check_all_service_statuses(&self) -> BTreeMap<String, ServiceStatus> {
        let probes = self.services.iter().map(|name| async move {
            let status = self.service_status(name).await;
            (name.clone(), status)
        });
        join_all(probes).await.into_iter().collect()
    }

    async fn service_status(&self, name: &str) -> ServiceStatus {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend([name, "v1.0", "status"]);
        }

        let started = Instant::now();
        match self.http.get(url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                ServiceStatus {
                    code: Some(code),
                    latency_ms: Some(elapsed_ms(started)),
                    ok: (200..300).contains(&code),
                    error: None,
                }
            }
            Err(e) => ServiceStatus {
                code: None,
                latency_ms: None,
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
