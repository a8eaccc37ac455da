// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rentri download` and `rentri void`.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use rentri_config::RentriConfig;
use rentri_core::{DocumentRecord, RentriError};
use rentri_worker::{BatchReport, download_documents, install_signal_handler, void_documents};

use crate::{prompt, session};

pub async fn run_download(
    config: &RentriConfig,
    block: &str,
    sequences: &[u64],
    out: &Path,
) -> Result<(), RentriError> {
    let (service, _store) = session::connect(config).await?;
    let listing = service.fetch_documents(block).await;
    let (selected, missing) = select(&listing.items, sequences);
    warn_missing(block, &missing);

    let cancel = install_signal_handler();
    let report = download_documents(
        &service,
        &selected,
        out,
        Duration::from_millis(config.workflow.download_interval_ms),
        &cancel,
    )
    .await;
    cancel.cancel();

    print_report("downloaded", &report);
    finish(&report)
}

pub async fn run_void(
    config: &RentriConfig,
    block: &str,
    sequences: &[u64],
    yes: bool,
) -> Result<(), RentriError> {
    let (service, _store) = session::connect(config).await?;
    let listing = service.fetch_documents(block).await;
    let (selected, missing) = select(&listing.items, sequences);
    warn_missing(block, &missing);

    if selected.is_empty() {
        println!("nothing to void");
        return Ok(());
    }
    for record in &selected {
        println!(
            "  {:>8}  {:<28} {}",
            record.sequence,
            record.display_tracking(),
            record.status
        );
    }
    if !yes
        && !prompt::confirm(format!("Void {} document(s) in {block}?", selected.len())).await?
    {
        println!("aborted");
        return Ok(());
    }

    let cancel = install_signal_handler();
    let report = void_documents(
        &service,
        &selected,
        Duration::from_millis(config.workflow.void_interval_ms),
        &cancel,
    )
    .await;
    cancel.cancel();

    print_report("voided", &report);
    finish(&report)
}

/// Records matching `sequences`, in request order, plus the sequences not found.
fn select(records: &[DocumentRecord], sequences: &[u64]) -> (Vec<DocumentRecord>, Vec<u64>) {
    let mut seen = BTreeSet::new();
    let mut selected = Vec::new();
    let mut missing = Vec::new();
    for &sequence in sequences {
        if !seen.insert(sequence) {
            continue;
        }
        match records.iter().find(|r| r.sequence == sequence) {
            Some(record) => selected.push(record.clone()),
            None => missing.push(sequence),
        }
    }
    (selected, missing)
}

fn warn_missing(block: &str, missing: &[u64]) {
    if !missing.is_empty() {
        let list: Vec<String> = missing.iter().map(u64::to_string).collect();
        eprintln!("warning: not found in {block}: {}", list.join(", "));
    }
}

fn print_report(verb: &str, report: &BatchReport) {
    println!();
    println!(
        "  {verb} {}/{} ({} skipped){}",
        report.succeeded,
        report.attempted,
        report.skipped,
        if report.cancelled { ", cancelled" } else { "" }
    );
    for error in &report.errors {
        println!("    {error}");
    }
}

fn finish(report: &BatchReport) -> Result<(), RentriError> {
    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(RentriError::TaskFailed(format!(
            "{} of {} operation(s) failed",
            report.errors.len(),
            report.attempted
        )))
    }
}
