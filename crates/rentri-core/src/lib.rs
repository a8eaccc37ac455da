// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the RENTRI client toolkit.
//!
//! Holds the error taxonomy, the domain types and the trait seams that the
//! HTTP client, the credential store and the background workflows meet at.

pub mod error;
pub mod traits;
pub mod types;

pub use error::RentriError;
pub use traits::{DocumentService, RequestSigner};
pub use types::{
    Block, DocumentRecord, DocumentStatus, ReachabilityReport, ServiceStatus, SignedDigest,
    VoidOutcome,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_429_to_rate_limited() {
        assert!(matches!(
            RentriError::from_status(429, "slow down"),
            RentriError::RateLimited
        ));
        match RentriError::from_status(503, "maintenance") {
            RentriError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: RentriError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, RentriError::Decode(_)));
        assert!(err.to_string().starts_with("decode error"));
    }

    #[test]
    fn trait_objects_are_usable() {
        fn _assert_service(_: &dyn DocumentService) {}
        fn _assert_signer(_: &dyn RequestSigner) {}
    }
}
