// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Page-by-page retrieval for list endpoints capped at 100 items.

use std::future::Future;

use rentri_core::RentriError;
use serde_json::Value;
use tracing::{debug, warn};

/// Largest page the service accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Items merged from every page that was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination<T> {
    pub items: Vec<T>,
    /// Page requests issued, the failing one included.
    pub requests: usize,
    /// A page failed and the listing may be incomplete.
    pub interrupted: bool,
}

/// Fetches pages `1, 2, ...` until one comes back empty or short.
///
/// `fetch_page(page, page_size)` is called with the clamped page size. An
/// error stops the loop and keeps whatever was already merged.
pub async fn fetch_all<T, F, Fut>(page_size: usize, mut fetch_page: F) -> Pagination<T>
where
    F: FnMut(usize, usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>, RentriError>>,
{
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        match fetch_page(page, page_size).await {
            Ok(batch) => {
                let received = batch.len();
                items.extend(batch);
                debug!(page, received, total = items.len(), "page merged");
                if received < page_size {
                    return Pagination {
                        items,
                        requests: page,
                        interrupted: false,
                    };
                }
                page += 1;
            }
            Err(e) => {
                warn!(page, error = %e, "pagination stopped early, returning partial list");
                return Pagination {
                    items,
                    requests: page,
                    interrupted: true,
                };
            }
        }
    }
}

/// Extracts the item array from a list response.
///
/// Accepts a bare array, or an object holding `data` (preferred) or `items`.
/// An object with neither is an empty page.
pub fn unwrap_page(body: Value) -> Result<Vec<Value>, RentriError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("items")) {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(RentriError::Decode(format!(
                "expected an array of items, found {}",
                kind(&other)
            ))),
        },
        other => Err(RentriError::Decode(format!(
            "expected a list response, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
