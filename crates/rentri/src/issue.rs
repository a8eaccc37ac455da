// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rentri issue`: runs the background issuance task with progress bars.

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rentri_config::RentriConfig;
use rentri_core::{DocumentService, RentriError};
use rentri_worker::{
    IssuanceSettings, IssuanceTask, TaskEvent, TaskOutcome, TaskPhase, TaskProgress,
    install_signal_handler,
};
use tracing::info;

use crate::session;

const BAR_TEMPLATE: &str = "{prefix:>10} [{bar:30}] {pos}/{len} {msg}";

pub async fn run_issue(
    config: &RentriConfig,
    block: &str,
    count: usize,
    out: PathBuf,
) -> Result<(), RentriError> {
    if count == 0 {
        return Err(RentriError::Config("--count must be at least 1".to_string()));
    }

    let (service, _store) = session::connect(config).await?;
    let service: Arc<dyn DocumentService> = Arc::new(service);
    let task = IssuanceTask::new(
        service,
        block,
        count,
        out.clone(),
        IssuanceSettings::from_config(&config.workflow),
    );

    info!(block, count, out = %out.display(), "starting issuance");
    let cancel = install_signal_handler();
    let mut handle = task.spawn(cancel.clone());

    let bars = Bars::new(count);
    while let Some(event) = handle.events.recv().await {
        if let TaskEvent::Finished(_) = event {
            break;
        }
        bars.apply(&event);
    }
    // Release the signal listener.
    cancel.cancel();

    let outcome = handle.join().await;
    bars.finish(&outcome);
    println!("{}", summary(&outcome, &out));

    match outcome {
        TaskOutcome::Failed { error, .. } => Err(RentriError::TaskFailed(error)),
        TaskOutcome::Completed(_) | TaskOutcome::Cancelled(_) => Ok(()),
    }
}

struct Bars {
    issue: ProgressBar,
    download: ProgressBar,
    _multi: MultiProgress,
}

impl Bars {
    fn new(count: usize) -> Self {
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        let multi = MultiProgress::new();
        let issue = multi.add(ProgressBar::new(count as u64).with_style(style.clone()));
        issue.set_prefix("issue");
        let download = multi.add(ProgressBar::new(0).with_style(style));
        download.set_prefix("download");
        Self {
            issue,
            download,
            _multi: multi,
        }
    }

    fn apply(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Phase(phase) => self.issue.set_message(phase.to_string()),
            TaskEvent::IssueAttempted { progress, .. } => {
                self.issue.set_position(progress.issue_attempted as u64);
                self.issue.set_message(format!("{} ok", progress.issued));
            }
            TaskEvent::DownloadPlanned { count } => self.download.set_length(*count as u64),
            TaskEvent::DownloadAttempted { progress, .. } => {
                self.download.set_position(progress.download_attempted as u64);
            }
            TaskEvent::Message(_) | TaskEvent::Finished(_) => {}
        }
    }

    fn finish(&self, outcome: &TaskOutcome) {
        let label = outcome.progress().phase.to_string();
        match outcome {
            TaskOutcome::Completed(_) => {
                self.issue.finish_with_message(label.clone());
                self.download.finish_with_message(label);
            }
            _ => {
                self.issue.abandon_with_message(label.clone());
                self.download.abandon_with_message(label);
            }
        }
    }
}

fn summary(outcome: &TaskOutcome, out: &std::path::Path) -> String {
    let p: &TaskProgress = outcome.progress();
    let head = match outcome {
        TaskOutcome::Completed(_) => "done".to_string(),
        TaskOutcome::Cancelled(_) => "cancelled".to_string(),
        TaskOutcome::Failed { error, .. } => format!("failed: {error}"),
    };
    let mut line = format!(
        "{head}: issued {}/{} ({} attempted)",
        p.issued, p.issue_target, p.issue_attempted
    );
    if p.phase == TaskPhase::Done || p.download_attempted > 0 {
        line.push_str(&format!(
            ", downloaded {}/{} into {}",
            p.downloaded,
            p.download_target,
            out.display()
        ));
    }
    line
}
