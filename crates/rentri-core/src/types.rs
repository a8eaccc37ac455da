// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the client, the worker and the CLI.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::RentriError;

/// A named range of issuable documents ("blocco vidimazione").
///
/// Read-only from the client's perspective; everything except the block
/// code is kept as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "codice_blocco")]
    pub code: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lifecycle state of a document as reflected from the remote registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Issued,
    Voided,
}

/// A document ("formulario") keyed by `(block_code, sequence)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub block_code: String,
    pub sequence: u64,
    pub tracking_number: Option<String>,
    pub issued_at: Option<String>,
    pub status: DocumentStatus,
    /// The full payload as returned by the service.
    pub raw: Value,
}

impl DocumentRecord {
    /// Builds a record from one item of a document listing.
    ///
    /// The sequence number is accepted either as a JSON number or as a
    /// numeric string, since both shapes appear in service responses.
    pub fn from_json(block_code: &str, raw: Value) -> Result<Self, RentriError> {
        let sequence = raw
            .get("progressivo")
            .and_then(parse_sequence)
            .ok_or_else(|| {
                RentriError::Decode(format!(
                    "document in block {block_code} has no usable `progressivo`"
                ))
            })?;

        let tracking_number = raw
            .get("numero_fir")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let issued_at = raw
            .get("data_vidimazione")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let status = derive_status(&raw);

        Ok(Self {
            block_code: block_code.to_string(),
            sequence,
            tracking_number,
            issued_at,
            status,
            raw,
        })
    }

    /// Tracking number for display and file naming, falling back to the sequence.
    pub fn display_tracking(&self) -> String {
        match self.tracking_number.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => self.sequence.to_string(),
        }
    }

    /// Only issued documents may be voided.
    pub fn is_voidable(&self) -> bool {
        self.status == DocumentStatus::Issued
    }
}

fn parse_sequence(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn derive_status(raw: &Value) -> DocumentStatus {
    let state_voided = raw
        .get("stato")
        .and_then(Value::as_str)
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("annullato"));
    let flag_voided = raw.get("is_annullato").and_then(Value::as_bool) == Some(true);

    if state_voided || flag_voided {
        DocumentStatus::Voided
    } else {
        DocumentStatus::Issued
    }
}

/// Result of a void request, kept verbatim for diagnostic display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoidOutcome {
    pub success: bool,
    /// HTTP status, absent when the request never got an answer.
    pub status: Option<u16>,
    /// Raw response text, or the transport error description.
    pub body: String,
}

/// Reachability of the service base endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityReport {
    pub reachable: bool,
    pub http_code: Option<u16>,
    pub latency_ms: Option<u64>,
    pub note: String,
}

/// Result of one sub-service `/status` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub code: Option<u16>,
    pub latency_ms: Option<u64>,
    pub ok: bool,
    pub error: Option<String>,
}

/// A signature token together with the `Digest` header value it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedDigest {
    pub token: String,
    pub digest: String,
}
