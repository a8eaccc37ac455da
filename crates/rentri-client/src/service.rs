// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain operations on the document-issuance service.
//!
//! Each operation has a `try_*` form returning `Result`; the
//! [`DocumentService`] impl wraps them, logs failures and returns the
//! operation's neutral fallback instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderName;
use rentri_core::{
    Block, DocumentRecord, DocumentService, ReachabilityReport, RentriError, ServiceStatus,
    VoidOutcome,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::http::{ApiClient, ApiRequest};
use crate::paginate::{Pagination, fetch_all, unwrap_page};
use crate::probe::Prober;

const SERVICE: &str = "vidimazione-formulari";
const VERSION: &str = "v1.0";

const PAGING_PAGE: HeaderName = HeaderName::from_static("paging-page");
const PAGING_PAGE_SIZE: HeaderName = HeaderName::from_static("paging-pagesize");

#[derive(Deserialize)]
struct RenderedFile {
    #[serde(default)]
    content: String,
}

/// Client for `/vidimazione-formulari/v1.0` plus the status probes.
pub struct RemoteService {
    client: Arc<ApiClient>,
    prober: Prober,
    page_size: usize,
}

impl RemoteService {
    pub fn new(client: Arc<ApiClient>, prober: Prober, page_size: usize) -> Self {
        Self {
            client,
            prober,
            page_size,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn endpoint(&self, tail: &[&str]) -> Url {
        self.client
            .endpoint([SERVICE, VERSION].iter().chain(tail.iter()))
    }

    pub async fn try_list_blocks(&self, subject_id: &str) -> Result<Vec<Block>, RentriError> {
        let mut url = self.endpoint(&[]);
        url.query_pairs_mut().append_pair("identificativo", subject_id);

        let response = self.client.call(&ApiRequest::get(url)).await?.error_for_status()?;
        unwrap_page(response.json()?)?
            .into_iter()
            .map(|item| Ok(serde_json::from_value::<Block>(item)?))
            .collect()
    }

    async fn try_document_page(
        &self,
        block_code: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Value>, RentriError> {
        let request = ApiRequest::get(self.endpoint(&[block_code]))
            .header(PAGING_PAGE, page.to_string())
            .header(PAGING_PAGE_SIZE, page_size.to_string());

        let response = self.client.call(&request).await?.error_for_status()?;
        unwrap_page(response.json()?)
    }

    /// Every document of a block, with pagination bookkeeping.
    ///
    /// Items that do not decode are logged and skipped; page lengths are
    /// judged on the raw item count.
    pub async fn fetch_documents(&self, block_code: &str) -> Pagination<DocumentRecord> {
        let pages = fetch_all(self.page_size, |page, size| {
            self.try_document_page(block_code, page, size)
        })
        .await;
        let items = pages
            .items
            .into_iter()
            .filter_map(|item| match DocumentRecord::from_json(block_code, item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(block = block_code, error = %e, "skipping malformed document");
                    None
                }
            })
            .collect();
        let result = Pagination {
            items,
            requests: pages.requests,
            interrupted: pages.interrupted,
        };
        debug!(
            block = block_code,
            total = result.items.len(),
            requests = result.requests,
            interrupted = result.interrupted,
            "documents listed"
        );
        result
    }

    pub async fn try_issue_document(&self, block_code: &str) -> Result<(), RentriError> {
        let request = ApiRequest::post(self.endpoint(&[block_code])).signed();
        self.client.call(&request).await?.error_for_status()?;
        info!(block = block_code, "document issued");
        Ok(())
    }

    /// Downloads the rendered file and returns the path it was written to.
    pub async fn try_fetch_rendered_file(
        &self,
        block_code: &str,
        sequence: u64,
        tracking_number: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, RentriError> {
        let sequence_segment = sequence.to_string();
        let request = ApiRequest::get(self.endpoint(&[block_code, &sequence_segment, "pdf"]))
            .accept("application/json");

        let response = self.client.call(&request).await?.error_for_status()?;
        let file: RenderedFile = response.json()?;
        if file.content.is_empty() {
            return Err(RentriError::Decode(
                "rendered file response has no content".to_string(),
            ));
        }
        let bytes = STANDARD
            .decode(file.content.trim())
            .map_err(|e| RentriError::Decode(format!("rendered file is not base64: {e}")))?;

        let path = dest_dir.join(rendered_file_name(tracking_number, sequence));
        tokio::fs::write(&path, bytes).await?;
        info!(block = block_code, sequence, path = %path.display(), "rendered file saved");
        Ok(path)
    }

    /// Sends the void request; only transport or signing failures are errors.
    pub async fn try_void_document(
        &self,
        block_code: &str,
        sequence: u64,
    ) -> Result<VoidOutcome, RentriError> {
        let sequence_segment = sequence.to_string();
        let request = ApiRequest::put(self.endpoint(&[block_code, &sequence_segment, "annulla"]))
            .signed()
            .accept("application/problem+json, application/json");

        let response = self.client.call(&request).await?;
        info!(block = block_code, sequence, status = response.status, "void requested");
        Ok(VoidOutcome {
            success: response.is_success(),
            status: Some(response.status),
            body: response.body,
        })
    }

    pub async fn try_verify_document(&self, tracking_number: &str) -> Result<Value, RentriError> {
        let request = ApiRequest::get(self.endpoint(&["verifica", tracking_number]));
        self.client.call(&request).await?.error_for_status()?.json()
    }

    /// Verification payload for a tracking number, `None` when unknown or unreachable.
    pub async fn verify_document(&self, tracking_number: &str) -> Option<Value> {
        self.try_verify_document(tracking_number)
            .await
            .inspect_err(|e| warn!(tracking = tracking_number, error = %e, "verify_document failed"))
            .ok()
    }

    pub async fn check_reachability(&self) -> ReachabilityReport {
        self.prober.check_reachability().await
    }

    pub async fn check_all_service_statuses(&self) -> BTreeMap<String, ServiceStatus> {
        self.prober.check_all_service_statuses().await
    }
}

#[async_trait]
impl DocumentService for RemoteService {
    async fn list_blocks(&self, subject_id: &str) -> Vec<Block> {
        self.try_list_blocks(subject_id).await.unwrap_or_else(|e| {
            warn!(error = %e, "list_blocks failed");
            Vec::new()
        })
    }

    async fn list_documents(&self, block_code: &str) -> Vec<DocumentRecord> {
        self.fetch_documents(block_code).await.items
    }

    async fn issue_document(&self, block_code: &str) -> bool {
        self.try_issue_document(block_code)
            .await
            .inspect_err(|e| warn!(block = block_code, error = %e, "issue_document failed"))
            .is_ok()
    }

    async fn fetch_rendered_file(
        &self,
        block_code: &str,
        sequence: u64,
        tracking_number: &str,
        dest_dir: &Path,
    ) -> bool {
        self.try_fetch_rendered_file(block_code, sequence, tracking_number, dest_dir)
            .await
            .inspect_err(|e| {
                warn!(block = block_code, sequence, error = %e, "fetch_rendered_file failed");
            })
            .is_ok()
    }

    async fn void_document(&self, block_code: &str, sequence: u64) -> VoidOutcome {
        self.try_void_document(block_code, sequence)
            .await
            .unwrap_or_else(|e| {
                warn!(block = block_code, sequence, error = %e, "void_document failed");
                VoidOutcome {
                    success: false,
                    status: None,
                    body: e.to_string(),
                }
            })
    }
}

/// File name for a rendered document, safe on every common filesystem.
pub fn rendered_file_name(tracking_number: &str, sequence: u64) -> String {
    let tracking = tracking_number.trim();
    let stem: String = if tracking.is_empty() {
        sequence.to_string()
    } else {
        tracking
            .chars()
            .map(|c| match c {
                ' ' => '_',
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c if c.is_control() => '-',
                c => c,
            })
            .collect()
    };
    format!("{stem}.pdf")
}
