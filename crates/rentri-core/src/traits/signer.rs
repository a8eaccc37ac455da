// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request signing seam consumed by the authenticated HTTP client.

use crate::error::RentriError;
use crate::types::SignedDigest;

/// Mints the per-request tokens attached to outgoing calls.
///
/// Implementations must produce a fresh token on every call: tokens carry
/// the current timestamp and a unique id, and are never cached or reused.
pub trait RequestSigner: Send + Sync {
    /// Fiscal identifier of the credential holder.
    fn subject_id(&self) -> &str;

    /// A bearer token for the `Authorization` header.
    fn auth_token(&self) -> Result<String, RentriError>;

    /// A payload-signature token and the `Digest` header value for `body`.
    fn sign_digest(&self, body: &[u8], content_type: &str) -> Result<SignedDigest, RentriError>;
}
