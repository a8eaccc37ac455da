// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phases, progress counters and the events a task reports.

use serde::Serialize;

/// Lifecycle phase of an issuance task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// Recording which documents already exist.
    Snapshot,
    /// Sending issuance requests.
    Issuing,
    /// Waiting for the registry to list the new documents.
    AwaitingSettlement,
    /// Matching new listings against the snapshot.
    Reconciling,
    /// Saving rendered files.
    Downloading,
    Done,
    Cancelled,
    Failed,
}

impl TaskPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled | Self::Failed)
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPhase::Snapshot => write!(f, "snapshot"),
            TaskPhase::Issuing => write!(f, "issuing"),
            TaskPhase::AwaitingSettlement => write!(f, "awaiting settlement"),
            TaskPhase::Reconciling => write!(f, "reconciling"),
            TaskPhase::Downloading => write!(f, "downloading"),
            TaskPhase::Done => write!(f, "done"),
            TaskPhase::Cancelled => write!(f, "cancelled"),
            TaskPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Counters for both loops. Never rolled back on cancellation or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskProgress {
    pub phase: TaskPhase,
    pub issue_target: usize,
    pub issue_attempted: usize,
    pub issued: usize,
    pub download_target: usize,
    pub download_attempted: usize,
    pub downloaded: usize,
}

impl TaskProgress {
    pub fn new(issue_target: usize) -> Self {
        Self {
            phase: TaskPhase::Snapshot,
            issue_target,
            issue_attempted: 0,
            issued: 0,
            download_target: 0,
            download_attempted: 0,
            downloaded: 0,
        }
    }
}

/// How a task ended. Every variant carries the final counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(TaskProgress),
    Cancelled(TaskProgress),
    Failed { progress: TaskProgress, error: String },
}

impl TaskOutcome {
    pub fn progress(&self) -> &TaskProgress {
        match self {
            TaskOutcome::Completed(p) | TaskOutcome::Cancelled(p) => p,
            TaskOutcome::Failed { progress, .. } => progress,
        }
    }
}

/// Progress notifications, delivered in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Phase(TaskPhase),
    Message(String),
    IssueAttempted { ok: bool, progress: TaskProgress },
    DownloadPlanned { count: usize },
    DownloadAttempted { ok: bool, progress: TaskProgress },
    Finished(TaskOutcome),
}
