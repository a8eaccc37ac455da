// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the RENTRI toolkit.
//!
//! - [`MockDocumentService`]: scriptable in-memory document service
//! - [`StaticSigner`]: fixed-token request signer

pub mod mock_service;
pub mod signer;

pub use mock_service::{FetchCall, MockDocumentService, document};
pub use signer::StaticSigner;
