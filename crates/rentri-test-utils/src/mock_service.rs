// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`DocumentService`] for workflow tests.
//!
//! Successful issuance appends a document with the next sequence number to
//! the block, so snapshot/reconcile logic sees realistic listings.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rentri_core::{Block, DocumentRecord, DocumentService, DocumentStatus, VoidOutcome};
use serde_json::json;

/// Builds an issued document record shaped like a listing item.
pub fn document(block_code: &str, sequence: u64) -> DocumentRecord {
    let tracking = format!("MOCK {block_code}/{sequence}");
    DocumentRecord {
        block_code: block_code.to_string(),
        sequence,
        tracking_number: Some(tracking.clone()),
        issued_at: None,
        status: DocumentStatus::Issued,
        raw: json!({"progressivo": sequence, "numero_fir": tracking}),
    }
}

/// A recorded `fetch_rendered_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub block_code: String,
    pub sequence: u64,
    pub tracking_number: String,
    pub dest_dir: PathBuf,
}

#[derive(Default)]
struct State {
    blocks: Vec<Block>,
    documents: BTreeMap<String, Vec<DocumentRecord>>,
    issue_outcomes: VecDeque<bool>,
    failing_fetches: HashSet<u64>,
    failing_voids: HashSet<u64>,
    panic_on_issue_call: Option<usize>,
    list_calls: usize,
    issue_calls: usize,
    fetch_calls: Vec<FetchCall>,
    void_calls: Vec<(String, u64)>,
}

/// Scriptable mock of the remote document service.
#[derive(Default)]
pub struct MockDocumentService {
    state: Mutex<State>,
}

impl MockDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_block(self, code: &str) -> Self {
        self.state().blocks.push(Block {
            code: code.to_string(),
            extra: Default::default(),
        });
        self
    }

    /// Seeds a block with documents for the given sequence numbers.
    pub fn with_documents(self, block_code: &str, sequences: impl IntoIterator<Item = u64>) -> Self {
        let records: Vec<_> = sequences
            .into_iter()
            .map(|seq| document(block_code, seq))
            .collect();
        self.state()
            .documents
            .entry(block_code.to_string())
            .or_default()
            .extend(records);
        self
    }

    /// Scripted results for successive `issue_document` calls; `true` once exhausted.
    pub fn with_issue_outcomes(self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.state().issue_outcomes.extend(outcomes);
        self
    }

    pub fn with_failing_fetch(self, sequence: u64) -> Self {
        self.state().failing_fetches.insert(sequence);
        self
    }

    pub fn with_failing_void(self, sequence: u64) -> Self {
        self.state().failing_voids.insert(sequence);
        self
    }

    pub fn panicking_on_issue(self) -> Self {
        self.panicking_on_issue_call(1)
    }

    /// Panics on the `call`-th `issue_document` call (1-based); earlier calls
    /// follow the scripted outcomes.
    pub fn panicking_on_issue_call(self, call: usize) -> Self {
        self.state().panic_on_issue_call = Some(call);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    pub fn issue_calls(&self) -> usize {
        self.state().issue_calls
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.state().fetch_calls.clone()
    }

    pub fn void_calls(&self) -> Vec<(String, u64)> {
        self.state().void_calls.clone()
    }

    pub fn documents(&self, block_code: &str) -> Vec<DocumentRecord> {
        self.state()
            .documents
            .get(block_code)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentService for MockDocumentService {
    async fn list_blocks(&self, _subject_id: &str) -> Vec<Block> {
        self.state().blocks.clone()
    }

    async fn list_documents(&self, block_code: &str) -> Vec<DocumentRecord> {
        let mut state = self.state();
        state.list_calls += 1;
        state.documents.get(block_code).cloned().unwrap_or_default()
    }

    async fn issue_document(&self, block_code: &str) -> bool {
        let mut state = self.state();
        state.issue_calls += 1;
        if state
            .panic_on_issue_call
            .is_some_and(|call| state.issue_calls >= call)
        {
            drop(state);
            panic!("mock issue_document panicked");
        }

        let ok = state.issue_outcomes.pop_front().unwrap_or(true);
        if ok {
            let docs = state.documents.entry(block_code.to_string()).or_default();
            let next = docs.iter().map(|d| d.sequence).max().unwrap_or(0) + 1;
            docs.push(document(block_code, next));
        }
        ok
    }

    async fn fetch_rendered_file(
        &self,
        block_code: &str,
        sequence: u64,
        tracking_number: &str,
        dest_dir: &Path,
    ) -> bool {
        let mut state = self.state();
        state.fetch_calls.push(FetchCall {
            block_code: block_code.to_string(),
            sequence,
            tracking_number: tracking_number.to_string(),
            dest_dir: dest_dir.to_path_buf(),
        });
        !state.failing_fetches.contains(&sequence)
    }

    async fn void_document(&self, block_code: &str, sequence: u64) -> VoidOutcome {
        let mut state = self.state();
        state.void_calls.push((block_code.to_string(), sequence));

        if state.failing_voids.contains(&sequence) {
            return VoidOutcome {
                success: false,
                status: Some(422),
                body: r#"{"title":"void rejected"}"#.to_string(),
            };
        }

        if let Some(doc) = state
            .documents
            .get_mut(block_code)
            .and_then(|docs| docs.iter_mut().find(|d| d.sequence == sequence))
        {
            doc.status = DocumentStatus::Voided;
        }
        VoidOutcome {
            success: true,
            status: Some(200),
            body: String::new(),
        }
    }
}
