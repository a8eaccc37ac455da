// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background issuance: snapshot, issue, settle, reconcile, download.
//!
//! The task reports every step over an unbounded channel and always ends
//! with exactly one [`TaskEvent::Finished`]. Cancellation is checked before
//! each phase and each loop iteration; waits end as soon as the token fires.
//! Calls already in flight are allowed to complete.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rentri_config::model::WorkflowConfig;
use rentri_core::{DocumentService, RentriError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::progress::{TaskEvent, TaskOutcome, TaskPhase, TaskProgress};
use crate::reconcile::reconcile;
use crate::shutdown::sleep_or_cancel;

/// Pacing between the steps of an issuance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuanceSettings {
    pub issue_interval: Duration,
    pub settle_delay: Duration,
    pub download_interval: Duration,
}

impl Default for IssuanceSettings {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

impl IssuanceSettings {
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            issue_interval: Duration::from_millis(config.issue_interval_ms),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            download_interval: Duration::from_millis(config.download_interval_ms),
        }
    }
}

/// Caller's side of a spawned task.
pub struct TaskHandle {
    pub events: mpsc::UnboundedReceiver<TaskEvent>,
    cancel: CancellationToken,
    join: JoinHandle<TaskOutcome>,
}

impl TaskHandle {
    /// Requests cancellation; the task stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Waits for the task to end.
    pub async fn join(self) -> TaskOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => TaskOutcome::Failed {
                progress: TaskProgress::new(0),
                error: format!("issuance supervisor stopped: {e}"),
            },
        }
    }
}

/// Issues `count` documents in one block and downloads the new ones.
pub struct IssuanceTask {
    service: Arc<dyn DocumentService>,
    block_code: String,
    count: usize,
    dest_dir: PathBuf,
    settings: IssuanceSettings,
}

enum Stop {
    Cancelled,
    Failed(RentriError),
}

type Step<T> = Result<T, Stop>;

impl IssuanceTask {
    pub fn new(
        service: Arc<dyn DocumentService>,
        block_code: impl Into<String>,
        count: usize,
        dest_dir: impl Into<PathBuf>,
        settings: IssuanceSettings,
    ) -> Self {
        Self {
            service,
            block_code: block_code.into(),
            count,
            dest_dir: dest_dir.into(),
            settings,
        }
    }

    /// Runs the task on the tokio runtime.
    ///
    /// A panic inside the worker is caught by a supervising task and turned
    /// into a `Failed` outcome carrying the last published progress, so
    /// `Finished` is still delivered and completed work is still counted.
    pub fn spawn(self, cancel: CancellationToken) -> TaskHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor_tx = tx.clone();
        let (snapshot_tx, snapshot_rx) = watch::channel(TaskProgress::new(self.count));
        let worker = tokio::spawn(self.drive(cancel.clone(), tx, snapshot_tx));

        let join = tokio::spawn(async move {
            match worker.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let reason = if e.is_panic() {
                        "issuance worker panicked".to_string()
                    } else {
                        format!("issuance worker aborted: {e}")
                    };
                    error!(error = %reason, "issuance task failed");
                    let mut progress = snapshot_rx.borrow().clone();
                    progress.phase = TaskPhase::Failed;
                    let outcome = TaskOutcome::Failed {
                        progress,
                        error: reason,
                    };
                    let _ = supervisor_tx.send(TaskEvent::Phase(TaskPhase::Failed));
                    let _ = supervisor_tx.send(TaskEvent::Finished(outcome.clone()));
                    outcome
                }
            }
        });

        TaskHandle {
            events: rx,
            cancel,
            join,
        }
    }

    /// Drives the task to completion on the current task.
    pub async fn run(
        self,
        cancel: CancellationToken,
        events: mpsc::UnboundedSender<TaskEvent>,
    ) -> TaskOutcome {
        let (snapshot, _) = watch::channel(TaskProgress::new(self.count));
        self.drive(cancel, events, snapshot).await
    }

    async fn drive(
        self,
        cancel: CancellationToken,
        events: mpsc::UnboundedSender<TaskEvent>,
        snapshot: watch::Sender<TaskProgress>,
    ) -> TaskOutcome {
        let mut run = Run {
            task: &self,
            cancel: &cancel,
            events: &events,
            snapshot: &snapshot,
            progress: TaskProgress::new(self.count),
        };

        let outcome = match run.execute().await {
            Ok(()) => {
                run.enter(TaskPhase::Done);
                info!(
                    block = %self.block_code,
                    issued = run.progress.issued,
                    downloaded = run.progress.downloaded,
                    "issuance completed"
                );
                TaskOutcome::Completed(run.progress.clone())
            }
            Err(Stop::Cancelled) => {
                run.enter(TaskPhase::Cancelled);
                info!(
                    block = %self.block_code,
                    issued = run.progress.issued,
                    downloaded = run.progress.downloaded,
                    "issuance cancelled"
                );
                TaskOutcome::Cancelled(run.progress.clone())
            }
            Err(Stop::Failed(e)) => {
                run.enter(TaskPhase::Failed);
                error!(block = %self.block_code, error = %e, "issuance failed");
                TaskOutcome::Failed {
                    progress: run.progress.clone(),
                    error: e.to_string(),
                }
            }
        };

        run.emit(TaskEvent::Finished(outcome.clone()));
        outcome
    }
}

struct Run<'a> {
    task: &'a IssuanceTask,
    cancel: &'a CancellationToken,
    events: &'a mpsc::UnboundedSender<TaskEvent>,
    snapshot: &'a watch::Sender<TaskProgress>,
    progress: TaskProgress,
}

impl Run<'_> {
    /// Publishes the current counters for the supervisor, then sends `event`.
    fn emit(&self, event: TaskEvent) {
        self.snapshot.send_replace(self.progress.clone());
        // A dropped receiver only means nobody is watching.
        let _ = self.events.send(event);
    }

    fn message(&self, text: String) {
        debug!(message = %text);
        self.emit(TaskEvent::Message(text));
    }

    fn enter(&mut self, phase: TaskPhase) {
        self.progress.phase = phase;
        self.emit(TaskEvent::Phase(phase));
    }

    fn checkpoint(&self) -> Step<()> {
        if self.cancel.is_cancelled() {
            Err(Stop::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn pause(&self, duration: Duration) -> Step<()> {
        if sleep_or_cancel(self.cancel, duration).await {
            Ok(())
        } else {
            Err(Stop::Cancelled)
        }
    }

    async fn execute(&mut self) -> Step<()> {
        let task = self.task;
        let block = task.block_code.as_str();

        self.checkpoint()?;
        self.enter(TaskPhase::Snapshot);
        self.message(format!("taking snapshot of block {block}"));
        let baseline: HashSet<u64> = task
            .service
            .list_documents(block)
            .await
            .iter()
            .map(|doc| doc.sequence)
            .collect();
        debug!(block, existing = baseline.len(), "snapshot taken");

        self.checkpoint()?;
        self.enter(TaskPhase::Issuing);
        for attempt in 1..=task.count {
            self.checkpoint()?;
            self.message(format!("issuing document {attempt}/{}", task.count));
            let ok = task.service.issue_document(block).await;
            self.progress.issue_attempted += 1;
            if ok {
                self.progress.issued += 1;
            }
            self.emit(TaskEvent::IssueAttempted {
                ok,
                progress: self.progress.clone(),
            });
            if attempt < task.count {
                self.pause(task.settings.issue_interval).await?;
            }
        }

        self.checkpoint()?;
        self.enter(TaskPhase::AwaitingSettlement);
        self.message(format!(
            "waiting {:?} for {} issued document(s) to be registered",
            task.settings.settle_delay, self.progress.issued
        ));
        self.pause(task.settings.settle_delay).await?;

        self.checkpoint()?;
        self.enter(TaskPhase::Reconciling);
        let after = task.service.list_documents(block).await;
        let fresh = reconcile(&baseline, &after, self.progress.issued);
        if fresh.len() < self.progress.issued {
            warn!(
                block,
                issued = self.progress.issued,
                found = fresh.len(),
                "fewer new documents listed than were issued"
            );
        }
        self.progress.download_target = fresh.len();
        self.emit(TaskEvent::DownloadPlanned { count: fresh.len() });

        self.checkpoint()?;
        self.enter(TaskPhase::Downloading);
        tokio::fs::create_dir_all(&task.dest_dir)
            .await
            .map_err(|e| Stop::Failed(RentriError::Io(e)))?;
        for (index, doc) in fresh.iter().enumerate() {
            self.checkpoint()?;
            let tracking = doc.display_tracking();
            self.message(format!(
                "downloading {}/{} ({tracking})",
                index + 1,
                fresh.len()
            ));
            let ok = task
                .service
                .fetch_rendered_file(block, doc.sequence, &tracking, &task.dest_dir)
                .await;
            self.progress.download_attempted += 1;
            if ok {
                self.progress.downloaded += 1;
            }
            self.emit(TaskEvent::DownloadAttempted {
                ok,
                progress: self.progress.clone(),
            });
            if index + 1 < fresh.len() {
                self.pause(task.settings.download_interval).await?;
            }
        }

        Ok(())
    }
}
