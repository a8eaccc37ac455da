// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain operations the workflows drive.

use std::path::Path;

use async_trait::async_trait;

use crate::types::{Block, DocumentRecord, VoidOutcome};

/// Fail-soft document operations against the registry.
///
/// Every method absorbs transport and decode failures and returns the
/// documented fallback (empty list, `false`, failed outcome) after logging
/// them, so long batch workflows keep going across transient blips.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Blocks available to `subject_id`; empty on any failure.
    async fn list_blocks(&self, subject_id: &str) -> Vec<Block>;

    /// Every document of a block, across all pages; possibly short on failure.
    async fn list_documents(&self, block_code: &str) -> Vec<DocumentRecord>;

    /// Issues one new document in the block.
    async fn issue_document(&self, block_code: &str) -> bool;

    /// Downloads the rendered file of a document into `dest_dir`.
    async fn fetch_rendered_file(
        &self,
        block_code: &str,
        sequence: u64,
        tracking_number: &str,
        dest_dir: &Path,
    ) -> bool;

    /// Voids an issued document.
    async fn void_document(&self, block_code: &str, sequence: u64) -> VoidOutcome;
}
