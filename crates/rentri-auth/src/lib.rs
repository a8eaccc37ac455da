// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Certificate-backed authentication for the RENTRI API.
//!
//! A PKCS#12 bundle is decoded once into a [`CredentialStore`], which then
//! mints short-lived bearer tokens and body-digest signature tokens through
//! the [`rentri_core::RequestSigner`] trait.

pub mod claims;
pub mod credential;
pub mod store;
pub mod subject;

pub use claims::{AuthClaims, SignedHeader, body_digest};
pub use credential::{
    BundleContents, BundleDecoder, PassphraseCandidate, Pkcs12Decoder, SigningAlgorithm,
    detect_algorithm, passphrase_candidates,
};
pub use store::CredentialStore;
pub use subject::{CertificateSubject, fiscal_code_in};
