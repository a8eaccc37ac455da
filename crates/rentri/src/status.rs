// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rentri status` command implementation.
//!
//! Probes the base endpoint and every configured sub-service. No credential
//! is needed, so this also works before a bundle has been set up.

use std::collections::BTreeMap;
use std::io::IsTerminal;

use rentri_client::Prober;
use rentri_config::RentriConfig;
use rentri_core::{ReachabilityReport, RentriError, ServiceStatus};
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub base_url: String,
    pub reachability: ReachabilityReport,
    pub services: BTreeMap<String, ServiceStatus>,
}

pub async fn run_status(config: &RentriConfig, json: bool, plain: bool) -> Result<(), RentriError> {
    let prober = Prober::from_config(config)?;
    let (reachability, services) = tokio::join!(
        prober.check_reachability(),
        prober.check_all_service_statuses()
    );
    let response = StatusResponse {
        base_url: config.api.base_url.clone(),
        reachability,
        services,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render(&response, use_color));
    }
    Ok(())
}

fn latency(ms: Option<u64>) -> String {
    ms.map(|ms| format!("{ms}ms")).unwrap_or_else(|| "-".to_string())
}

fn mark(ok: bool, use_color: bool) -> String {
    use colored::Colorize;

    match (ok, use_color) {
        (true, true) => "✓".green().to_string(),
        (false, true) => "✗".red().to_string(),
        (true, false) => "[OK]  ".to_string(),
        (false, false) => "[FAIL]".to_string(),
    }
}

fn render(status: &StatusResponse, use_color: bool) -> String {
    let mut out = String::new();
    let r = &status.reachability;

    out.push('\n');
    out.push_str("  rentri status\n");
    out.push_str(&format!("  {}\n", "-".repeat(50)));
    out.push_str(&format!(
        "    {} {:<24} {:>6} {}\n",
        mark(r.reachable, use_color),
        status.base_url,
        latency(r.latency_ms),
        r.note
    ));
    out.push('\n');

    for (name, service) in &status.services {
        let detail = match (&service.code, &service.error) {
            (_, Some(error)) => error.clone(),
            (Some(code), None) => format!("HTTP {code}"),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "    {} {:<24} {:>6} {}\n",
            mark(service.ok, use_color),
            name,
            latency(service.latency_ms),
            detail
        ));
    }

    let failing = status.services.values().filter(|s| !s.ok).count();
    out.push('\n');
    if failing == 0 && r.reachable {
        out.push_str("  All services reachable.\n");
    } else {
        let word = if failing == 1 { "service" } else { "services" };
        out.push_str(&format!("  {failing} {word} not OK.\n"));
    }
    out.push('\n');
    out
}
