// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of the `rentri` binary.
//!
//! Each test writes its own config file and passes it with `--config`, so
//! nothing from the host's configuration hierarchy leaks in.

use std::path::Path;
use std::process::{Command, Output};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rentri(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rentri"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("RENTRI_CREDENTIAL_BUNDLE_PATH")
        .env_remove("RENTRI_CREDENTIAL_FISCAL_CODE")
        .env_remove("RENTRI_API_BASE_URL")
        .output()
        .expect("binary runs")
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let file = dir.join("rentri.toml");
    std::fs::write(&file, body).unwrap();
    file
}

#[test]
fn misspelled_key_is_reported_with_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[rate_limit]\nmax_request = 10\n");

    let output = rentri(&config, &["status", "--plain"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_requests"), "stderr: {stderr}");
}

#[test]
fn authenticated_command_without_bundle_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[credential]\nfiscal_code = \"RSSMRA80A01H501U\"\n");

    let output = rentri(&config, &["blocks"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("credential.bundle_path"), "stderr: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn status_json_reports_every_service() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/codifiche/v1.0/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/formulari/v1.0/status"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &format!(
            "[api]\nbase_url = \"{}\"\n\n[probe]\ntimeout_secs = 2\nservices = [\"codifiche\", \"formulari\"]\n",
            server.uri()
        ),
    );

    let output = tokio::task::spawn_blocking(move || rentri(&config, &["status", "--json"]))
        .await
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["reachability"]["reachable"], true);
    assert_eq!(report["reachability"]["http_code"], 404);
    assert_eq!(report["services"]["codifiche"]["ok"], true);
    assert_eq!(report["services"]["formulari"]["ok"], false);
    assert_eq!(report["services"]["formulari"]["code"], 503);
}
