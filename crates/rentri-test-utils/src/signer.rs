// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic [`RequestSigner`] for transport tests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rentri_core::{RentriError, RequestSigner, SignedDigest};
use sha2::{Digest, Sha256};

/// Returns fixed tokens and a real `SHA-256=` digest of the body.
#[derive(Debug, Clone)]
pub struct StaticSigner {
    pub subject_id: String,
    pub bearer: String,
    pub signature: String,
}

impl Default for StaticSigner {
    fn default() -> Self {
        Self {
            subject_id: "TSTCFS80A01H501X".to_string(),
            bearer: "static-bearer".to_string(),
            signature: "static-signature".to_string(),
        }
    }
}

impl RequestSigner for StaticSigner {
    fn subject_id(&self) -> &str {
        &self.subject_id
    }

    fn auth_token(&self) -> Result<String, RentriError> {
        Ok(self.bearer.clone())
    }

    fn sign_digest(&self, body: &[u8], _content_type: &str) -> Result<SignedDigest, RentriError> {
        Ok(SignedDigest {
            token: self.signature.clone(),
            digest: format!("SHA-256={}", STANDARD.encode(Sha256::digest(body))),
        })
    }
}
