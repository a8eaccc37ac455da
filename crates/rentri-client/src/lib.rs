// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the RENTRI document-issuance API.
//!
//! [`ApiClient`] owns transport concerns (tokens, rate window, 429 retry),
//! [`RemoteService`] maps domain operations onto endpoints, and [`Prober`]
//! checks reachability without credentials.

pub mod http;
pub mod paginate;
pub mod probe;
pub mod rate;
pub mod service;

use std::sync::Arc;

use rentri_config::RentriConfig;
use rentri_core::{RentriError, RequestSigner};

pub use http::{ApiClient, ApiRequest, ApiResponse, AuthMode, JSON_CONTENT_TYPE};
pub use paginate::{MAX_PAGE_SIZE, Pagination, fetch_all, unwrap_page};
pub use probe::Prober;
pub use rate::{RateLimiter, RateWindow};
pub use service::{RemoteService, rendered_file_name};

impl RemoteService {
    /// Wires client, rate limiter and prober from configuration.
    pub fn from_config(
        config: &RentriConfig,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self, RentriError> {
        let client = ApiClient::from_config(config, signer)?;
        let prober = Prober::from_config(config)?;
        Ok(Self::new(Arc::new(client), prober, config.api.page_size))
    }
}
