// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated, rate-limited HTTP transport for the RENTRI API.
//!
//! [`ApiClient`] mints fresh tokens for every attempt, waits for a slot in
//! its own [`RateLimiter`], and retries exactly once after an HTTP 429.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderName};
use rentri_core::{RentriError, RequestSigner};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::rate::RateLimiter;

/// Content type bound into every signed request.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const SIGNATURE_HEADER: HeaderName = HeaderName::from_static("agid-jwt-signature");
const DIGEST_HEADER: HeaderName = HeaderName::from_static("digest");

/// How a request is authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer` only.
    Bearer,
    /// Bearer plus `Agid-JWT-Signature` and `Digest` over the body.
    Signed,
}

/// One logical API call, replayable for the 429 retry.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    auth: AuthMode,
    headers: Vec<(HeaderName, String)>,
    body: Vec<u8>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            auth: AuthMode::Bearer,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn put(url: Url) -> Self {
        Self::new(Method::PUT, url)
    }

    pub fn signed(mut self) -> Self {
        self.auth = AuthMode::Signed;
        self
    }

    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn accept(self, value: &str) -> Self {
        self.header(ACCEPT, value)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }
}

/// Status and body of a completed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-2xx response into the matching [`RentriError`].
    pub fn error_for_status(self) -> Result<Self, RentriError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RentriError::from_status(self.status, self.body))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RentriError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// HTTP client bound to one credential and one rate window.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    signer: Arc<dyn RequestSigner>,
    limiter: RateLimiter,
    throttle_cooldown: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        signer: Arc<dyn RequestSigner>,
        limiter: RateLimiter,
        request_timeout: Duration,
        throttle_cooldown: Duration,
    ) -> Result<Self, RentriError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RentriError::Config(format!("invalid base URL `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RentriError::Config(format!(
                "`{base_url}` cannot be used as a base URL"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| RentriError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            http,
            base_url,
            signer,
            limiter,
            throttle_cooldown,
        })
    }

    pub fn from_config(
        config: &rentri_config::RentriConfig,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self, RentriError> {
        Self::new(
            &config.api.base_url,
            signer,
            RateLimiter::from_config(&config.rate_limit),
            config.api.request_timeout(),
            config.api.throttle_cooldown(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subject_id(&self) -> &str {
        self.signer.subject_id()
    }

    /// Base URL extended with percent-encoded path segments.
    pub fn endpoint<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so path_segments_mut succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends a request with rate limiting and one retry on HTTP 429.
    ///
    /// Non-success statuses are returned as responses, a second 429 included.
    pub async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, RentriError> {
        self.limiter.acquire().await;
        let response = self.send(request).await?;
        if response.status != 429 {
            return Ok(response);
        }

        warn!(
            url = %request.url,
            cooldown_secs = self.throttle_cooldown.as_secs_f64(),
            "throttled by remote service (HTTP 429), retrying once"
        );
        tokio::time::sleep(self.throttle_cooldown).await;
        self.limiter.acquire().await;
        self.send(request).await
    }

    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, RentriError> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .bearer_auth(self.signer.auth_token()?);

        if request.auth == AuthMode::Signed {
            let signed = self.signer.sign_digest(&request.body, JSON_CONTENT_TYPE)?;
            builder = builder
                .header(SIGNATURE_HEADER, signed.token)
                .header(DIGEST_HEADER, signed.digest)
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.clone(), value.as_str());
        }
        if request.auth == AuthMode::Signed || !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            RentriError::transport(format!("{} {} failed", request.method, request.url), e)
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| RentriError::transport("failed to read response body", e))?;

        debug!(method = %request.method, url = %request.url, status, "response received");
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentri_core::SignedDigest;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedSigner;

    impl RequestSigner for FixedSigner {
        fn subject_id(&self) -> &str {
            "SUBJECT"
        }

        fn auth_token(&self) -> Result<String, RentriError> {
            Ok("bearer-token".to_string())
        }

        fn sign_digest(&self, body: &[u8], _content_type: &str) -> Result<SignedDigest, RentriError> {
            Ok(SignedDigest {
                token: "signature-token".to_string(),
                digest: format!("SHA-256=len{}", body.len()),
            })
        }
    }

    fn client(base: &str, cooldown: Duration) -> ApiClient {
        ApiClient::new(
            base,
            Arc::new(FixedSigner),
            RateLimiter::new(90, Duration::from_secs(5), Duration::from_millis(50)),
            Duration::from_secs(5),
            cooldown,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn bearer_request_sends_authorization_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/svc/v1.0"))
            .and(header("authorization", "Bearer bearer-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), Duration::from_millis(10));
        let url = client.endpoint(["svc", "v1.0"]);
        let response = client.call(&ApiRequest::get(url)).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "[]");

        let received = server.received_requests().await.unwrap();
        assert!(!received[0].headers.contains_key("agid-jwt-signature"));
    }

    #[tokio::test]
    async fn signed_request_carries_signature_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/svc/B1"))
            .and(header("authorization", "Bearer bearer-token"))
            .and(header("agid-jwt-signature", "signature-token"))
            .and(header("digest", "SHA-256=len0"))
            .and(header("content-type", JSON_CONTENT_TYPE))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), Duration::from_millis(10));
        let url = client.endpoint(["svc", "B1"]);
        let response = client.call(&ApiRequest::post(url).signed()).await.unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn retries_once_after_429() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/svc"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/svc"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = client(&server.uri(), Duration::from_millis(20));
        let response = client
            .call(&ApiRequest::get(client.endpoint(["svc"])))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cooldown_is_waited_before_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/svc"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/svc"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let cooldown = Duration::from_millis(400);
        let client = client(&server.uri(), cooldown);
        let started = std::time::Instant::now();
        let response = client
            .call(&ApiRequest::get(client.endpoint(["svc"])))
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.status, 200);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
        assert!(elapsed >= cooldown, "retried after {elapsed:?}");
    }

    #[tokio::test]
    async fn second_429_is_returned_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/svc"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server.uri(), Duration::from_millis(20));
        let response = client
            .call(&ApiRequest::get(client.endpoint(["svc"])))
            .await
            .unwrap();
        assert_eq!(response.status, 429);
        assert_eq!(response.body, "slow down");
        assert!(matches!(
            response.error_for_status(),
            Err(RentriError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/svc"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server.uri(), Duration::from_millis(20));
        let response = client
            .call(&ApiRequest::get(client.endpoint(["svc"])))
            .await
            .unwrap();
        assert!(matches!(
            response.error_for_status(),
            Err(RentriError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let client = client("http://127.0.0.1:9", Duration::from_millis(20));
        let err = client
            .call(&ApiRequest::get(client.endpoint(["svc"])))
            .await
            .unwrap_err();
        assert!(matches!(err, RentriError::Transport { .. }));
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let client = client("https://api.example.org/base/", Duration::ZERO);
        let url = client.endpoint(["vidimazione-formulari", "v1.0", "A B/C"]);
        assert_eq!(
            url.as_str(),
            "https://api.example.org/base/vidimazione-formulari/v1.0/A%20B%2FC"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        let err = ApiClient::new(
            "mailto:someone@example.org",
            Arc::new(FixedSigner),
            RateLimiter::new(1, Duration::from_secs(1), Duration::ZERO),
            Duration::from_secs(1),
            Duration::ZERO,
        )
        .err()
        .unwrap();
        assert!(matches!(err, RentriError::Config(_)));
    }
}
