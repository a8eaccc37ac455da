// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JWT claim set shared by bearer and signature tokens.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Token lifetime in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 300;

/// A header bound into a signature token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignedHeader {
    #[serde(rename = "digest")]
    Digest(String),
    #[serde(rename = "content-type")]
    ContentType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_headers: Option<Vec<SignedHeader>>,
}

impl AuthClaims {
    /// Claims for an `Authorization: Bearer` token.
    pub fn bearer(audience: &str, subject: &str, now: DateTime<Utc>) -> Self {
        Self::base(audience, subject, "auth", now)
    }

    /// Claims for an `Agid-JWT-Signature` token covering `digest`.
    pub fn signature(
        audience: &str,
        subject: &str,
        digest: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut claims = Self::base(audience, subject, "sig", now);
        claims.signed_headers = Some(vec![
            SignedHeader::Digest(digest.to_string()),
            SignedHeader::ContentType(content_type.to_string()),
        ]);
        claims
    }

    fn base(audience: &str, subject: &str, kind: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            aud: audience.to_string(),
            iss: subject.to_string(),
            sub: subject.to_string(),
            iat,
            nbf: iat,
            exp: iat + TOKEN_LIFETIME_SECS,
            jti: format!("{kind}-{}", uuid::Uuid::new_v4()),
            signed_headers: None,
        }
    }
}

/// `Digest` header value for a request body: `SHA-256=<base64>`.
pub fn body_digest(body: &[u8]) -> String {
    format!("SHA-256={}", STANDARD.encode(Sha256::digest(body)))
}
