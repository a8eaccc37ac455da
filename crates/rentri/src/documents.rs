// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rentri blocks`, `rentri documents` and `rentri verify`.

use std::str::FromStr;

use rentri_client::RemoteService;
use rentri_config::RentriConfig;
use rentri_core::{DocumentRecord, DocumentStatus, RentriError, RequestSigner};

use crate::session;

/// Text and state filter applied to a document listing.
#[derive(Debug, Default)]
pub struct DocumentFilter {
    query: Option<String>,
    status: Option<DocumentStatus>,
}

impl DocumentFilter {
    pub fn new(search: Option<&str>, status: Option<&str>) -> Result<Self, RentriError> {
        let query = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let status = status
            .map(|s| {
                DocumentStatus::from_str(&s.trim().to_lowercase()).map_err(|_| {
                    RentriError::Config(format!(
                        "unknown document status `{s}` (expected issued or voided)"
                    ))
                })
            })
            .transpose()?;
        Ok(Self { query, status })
    }

    /// Matches the query against tracking number, block code and sequence.
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        if let Some(status) = self.status
            && record.status != status
        {
            return false;
        }
        match &self.query {
            Some(query) => {
                let haystack = format!(
                    "{} {} {}",
                    record.tracking_number.as_deref().unwrap_or_default(),
                    record.block_code,
                    record.sequence
                )
                .to_lowercase();
                haystack.contains(query.as_str())
            }
            None => true,
        }
    }
}

pub async fn run_blocks(config: &RentriConfig) -> Result<(), RentriError> {
    let (service, store) = session::connect(config).await?;
    let blocks = service.try_list_blocks(store.subject_id()).await?;

    let holder = store.holder_name().unwrap_or("unknown holder");
    if blocks.is_empty() {
        println!("no blocks for {} ({holder})", store.subject_id());
        return Ok(());
    }
    println!("{} ({holder})", store.subject_id());
    for block in &blocks {
        let details: Vec<String> = block
            .extra
            .iter()
            .filter(|(_, v)| v.is_string() || v.is_number())
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{k}={s}"),
                None => format!("{k}={v}"),
            })
            .collect();
        println!("{:<24} {}", block.code, details.join("  "));
    }
    Ok(())
}

pub async fn run_documents(
    config: &RentriConfig,
    block: Option<&str>,
    filter: &DocumentFilter,
    json: bool,
) -> Result<(), RentriError> {
    let (service, store) = session::connect(config).await?;
    let listing = list_documents(&service, store.subject_id(), block).await?;
    if listing.interrupted > 0 {
        eprintln!(
            "warning: listing stopped early in {} block(s); results may be incomplete",
            listing.interrupted
        );
    }

    let selected: Vec<&DocumentRecord> =
        listing.records.iter().filter(|r| filter.matches(r)).collect();

    if json {
        let raw: Vec<&serde_json::Value> = selected.iter().map(|r| &r.raw).collect();
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    for record in &selected {
        println!("{}", format_record(record));
    }
    println!();
    let scope = match block {
        Some(block) => block.to_string(),
        None => format!("{} block(s)", listing.blocks),
    };
    println!(
        "  {} of {} document(s) in {scope}",
        selected.len(),
        listing.records.len()
    );
    Ok(())
}

/// Documents merged across the listed blocks.
#[derive(Debug, Default)]
struct Listing {
    records: Vec<DocumentRecord>,
    blocks: usize,
    /// Blocks whose pagination stopped on an error.
    interrupted: usize,
}

/// Lists one block, or every block of `subject_id` when `block` is `None`.
async fn list_documents(
    service: &RemoteService,
    subject_id: &str,
    block: Option<&str>,
) -> Result<Listing, RentriError> {
    let codes = match block {
        Some(block) => vec![block.to_string()],
        None => service
            .try_list_blocks(subject_id)
            .await?
            .into_iter()
            .map(|b| b.code)
            .collect(),
    };

    let mut listing = Listing {
        blocks: codes.len(),
        ..Default::default()
    };
    for code in &codes {
        let page = service.fetch_documents(code).await;
        if page.interrupted {
            listing.interrupted += 1;
        }
        listing.records.extend(page.items);
    }
    Ok(listing)
}

pub async fn run_verify(config: &RentriConfig, tracking: &str) -> Result<(), RentriError> {
    let (service, _store) = session::connect(config).await?;
    match service.verify_document(tracking).await {
        Some(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        None => Err(RentriError::Internal(format!(
            "no verification result for {tracking}"
        ))),
    }
}

fn format_record(record: &DocumentRecord) -> String {
    format!(
        "{:>8}  {:<28} {:<8} {}",
        record.sequence,
        record.display_tracking(),
        record.status,
        record.issued_at.as_deref().unwrap_or("-")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use rentri_client::{ApiClient, Prober, RateLimiter};
    use rentri_test_utils::{StaticSigner, document};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn search_is_case_insensitive() {
        let filter = DocumentFilter::new(Some("  mock b1/"), None).unwrap();
        assert!(filter.matches(&document("B1", 4)));
        assert!(!filter.matches(&document("B2", 4)));
    }

    #[test]
    fn search_matches_sequence() {
        let filter = DocumentFilter::new(Some("17"), None).unwrap();
        let mut record = document("B1", 17);
        record.tracking_number = None;
        assert!(filter.matches(&record));
        assert!(!filter.matches(&document("B1", 3)));
    }

    #[test]
    fn status_filter() {
        let filter = DocumentFilter::new(None, Some("Voided")).unwrap();
        let mut voided = document("B1", 1);
        voided.status = DocumentStatus::Voided;
        assert!(filter.matches(&voided));
        assert!(!filter.matches(&document("B1", 2)));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(DocumentFilter::new(None, Some("pending")).is_err());
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = DocumentFilter::new(Some("   "), None).unwrap();
        assert!(filter.matches(&document("ANY", 1)));
    }

    const BASE: &str = "/vidimazione-formulari/v1.0";

    fn service(server: &MockServer) -> RemoteService {
        let client = ApiClient::new(
            &server.uri(),
            Arc::new(StaticSigner::default()),
            RateLimiter::new(90, Duration::from_secs(5), Duration::from_millis(5)),
            Duration::from_secs(5),
            Duration::from_millis(10),
        )
        .unwrap();
        let prober = Prober::new(&server.uri(), Duration::from_secs(2), 0, Vec::new()).unwrap();
        RemoteService::new(Arc::new(client), prober, 100)
    }

    async fn mount_documents(server: &MockServer, block: &str, sequences: &[u64]) {
        let items: Vec<_> = sequences
            .iter()
            .map(|n| json!({"progressivo": n, "numero_fir": format!("FIR {block}/{n}")}))
            .collect();
        Mock::given(method("GET"))
            .and(path(format!("{BASE}/{block}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn without_block_every_block_is_listed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(BASE))
            .and(query_param("identificativo", "RSSMRA80A01H501U"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"codice_blocco": "B1"},
                {"codice_blocco": "B2"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        mount_documents(&server, "B1", &[1, 2]).await;
        mount_documents(&server, "B2", &[7]).await;

        let listing = list_documents(&service(&server), "RSSMRA80A01H501U", None)
            .await
            .unwrap();
        assert_eq!(listing.blocks, 2);
        assert_eq!(listing.interrupted, 0);
        let found: Vec<_> = listing
            .records
            .iter()
            .map(|r| (r.block_code.as_str(), r.sequence))
            .collect();
        assert_eq!(found, vec![("B1", 1), ("B1", 2), ("B2", 7)]);
    }

    #[tokio::test]
    async fn named_block_skips_block_listing() {
        let server = MockServer::start().await;
        mount_documents(&server, "B2", &[7, 8]).await;

        let listing = list_documents(&service(&server), "RSSMRA80A01H501U", Some("B2"))
            .await
            .unwrap();
        assert_eq!(listing.blocks, 1);
        assert_eq!(listing.records.len(), 2);

        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.url.path() == format!("{BASE}/B2")));
    }

    #[tokio::test]
    async fn block_listing_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(BASE))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = list_documents(&service(&server), "RSSMRA80A01H501U", None).await;
        assert!(result.is_err());
    }

    #[test]
    fn record_line_shows_tracking_and_state() {
        let line = format_record(&document("B1", 12));
        assert!(line.contains("MOCK B1/12"));
        assert!(line.contains("issued"));
    }
}
