// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the HTTP layer, the credential layer and the workflows.

pub mod service;
pub mod signer;

pub use service::DocumentService;
pub use signer::RequestSigner;
