// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-running workflows built on a [`rentri_core::DocumentService`].
//!
//! - [`IssuanceTask`] issues a batch of documents in the background,
//!   reconciles the new ones against a snapshot and downloads them.
//! - [`void_documents`] and [`download_documents`] run sequential batches
//!   over an explicit selection.
//!
//! Everything here is cancellable through a shared
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod batch;
pub mod issuance;
pub mod progress;
pub mod reconcile;
pub mod shutdown;

pub use batch::{BatchReport, download_documents, void_documents};
pub use issuance::{IssuanceSettings, IssuanceTask, TaskHandle};
pub use progress::{TaskEvent, TaskOutcome, TaskPhase, TaskProgress};
pub use reconcile::reconcile;
pub use shutdown::{install_signal_handler, sleep_or_cancel};
pub use tokio_util::sync::CancellationToken;
