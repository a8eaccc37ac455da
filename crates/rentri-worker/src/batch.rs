// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sequential void and download runs over a selection of documents.

use std::path::Path;
use std::time::Duration;

use rentri_core::{DocumentRecord, DocumentService};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::shutdown::sleep_or_cancel;

/// Summary of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Records that were not eligible for the operation.
    pub skipped: usize,
    /// One `<tracking>: <detail>` line per failed record.
    pub errors: Vec<String>,
    pub cancelled: bool,
}

/// Voids every issued document in `records`, pausing `interval` between calls.
pub async fn void_documents(
    service: &dyn DocumentService,
    records: &[DocumentRecord],
    interval: Duration,
    cancel: &CancellationToken,
) -> BatchReport {
    let mut report = BatchReport::default();
    let eligible: Vec<&DocumentRecord> = records.iter().filter(|r| r.is_voidable()).collect();
    report.skipped = records.len() - eligible.len();

    for (index, record) in eligible.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let outcome = service
            .void_document(&record.block_code, record.sequence)
            .await;
        report.attempted += 1;
        if outcome.success {
            report.succeeded += 1;
        } else {
            let detail = match outcome.status {
                Some(status) => format!("HTTP {status} {}", outcome.body.trim()),
                None => outcome.body.trim().to_string(),
            };
            warn!(block = %record.block_code, sequence = record.sequence, %detail, "void rejected");
            report
                .errors
                .push(format!("{}: {detail}", record.display_tracking()));
        }

        if index + 1 < eligible.len() && !sleep_or_cancel(cancel, interval).await {
            report.cancelled = true;
            break;
        }
    }

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        skipped = report.skipped,
        cancelled = report.cancelled,
        "void batch finished"
    );
    report
}

/// Downloads the rendered file of every record into `dest_dir`.
pub async fn download_documents(
    service: &dyn DocumentService,
    records: &[DocumentRecord],
    dest_dir: &Path,
    interval: Duration,
    cancel: &CancellationToken,
) -> BatchReport {
    let mut report = BatchReport::default();

    if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
        report
            .errors
            .push(format!("{}: {e}", dest_dir.display()));
        return report;
    }

    for (index, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let tracking = record.display_tracking();
        let ok = service
            .fetch_rendered_file(&record.block_code, record.sequence, &tracking, dest_dir)
            .await;
        report.attempted += 1;
        if ok {
            report.succeeded += 1;
        } else {
            report.errors.push(format!("{tracking}: download failed"));
        }

        if index + 1 < records.len() && !sleep_or_cancel(cancel, interval).await {
            report.cancelled = true;
            break;
        }
    }

    info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        cancelled = report.cancelled,
        "download batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentri_core::DocumentStatus;
    use rentri_test_utils::{MockDocumentService, document};

    const INTERVAL: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn void_skips_already_voided() {
        let mock = MockDocumentService::new().with_documents("B1", [1, 2, 3]);
        let mut records: Vec<_> = (1..=3).map(|s| document("B1", s)).collect();
        records[1].status = DocumentStatus::Voided;

        let report = void_documents(&mock, &records, INTERVAL, &CancellationToken::new()).await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.errors.is_empty());
        assert_eq!(
            mock.void_calls(),
            vec![("B1".to_string(), 1), ("B1".to_string(), 3)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn void_errors_name_the_tracking_number() {
        let mock = MockDocumentService::new()
            .with_documents("B1", [1, 2])
            .with_failing_void(2);
        let records: Vec<_> = (1..=2).map(|s| document("B1", s)).collect();

        let report = void_documents(&mock, &records, INTERVAL, &CancellationToken::new()).await;
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("MOCK B1/2: HTTP 422"), "{:?}", report.errors);
    }

    #[tokio::test(start_paused = true)]
    async fn void_waits_between_calls_only() {
        let mock = MockDocumentService::new().with_documents("B1", [1, 2, 3]);
        let records: Vec<_> = (1..=3).map(|s| document("B1", s)).collect();

        let start = tokio::time::Instant::now();
        void_documents(&mock, &records, INTERVAL, &CancellationToken::new()).await;
        assert_eq!(start.elapsed(), INTERVAL * 2);
    }

    #[tokio::test]
    async fn cancelled_batch_stops_early() {
        let mock = MockDocumentService::new();
        let records: Vec<_> = (1..=3).map(|s| document("B1", s)).collect();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let dir = tempfile::tempdir().unwrap();
        let report = download_documents(&mock, &records, dir.path(), INTERVAL, &cancel).await;
        assert!(report.cancelled);
        assert_eq!(report.attempted, 0);
        assert!(mock.fetch_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn download_reports_failures() {
        let mock = MockDocumentService::new().with_failing_fetch(2);
        let records: Vec<_> = (1..=3).map(|s| document("B1", s)).collect();
        let dir = tempfile::tempdir().unwrap();

        let report = download_documents(
            &mock,
            &records,
            dir.path(),
            Duration::from_millis(1),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.errors, vec!["MOCK B1/2: download failed".to_string()]);

        let calls = mock.fetch_calls();
        assert_eq!(calls[0].tracking_number, "MOCK B1/1");
        assert_eq!(calls[0].dest_dir, dir.path());
    }
}
