// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identifying the documents created by an issuance run.

use std::collections::HashSet;

use rentri_core::DocumentRecord;

/// Documents absent from `baseline`, highest sequence first, at most `issued`.
///
/// Anything issued concurrently by another client also shows up as new, so
/// this is a best-effort guess: the highest sequences are assumed to be ours.
pub fn reconcile(
    baseline: &HashSet<u64>,
    after: &[DocumentRecord],
    issued: usize,
) -> Vec<DocumentRecord> {
    let mut fresh: Vec<DocumentRecord> = after
        .iter()
        .filter(|doc| !baseline.contains(&doc.sequence))
        .cloned()
        .collect();
    fresh.sort_by(|a, b| b.sequence.cmp(&a.sequence));
    fresh.truncate(issued);
    fresh
}
