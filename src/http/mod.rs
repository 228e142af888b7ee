//! HTTP transport module
//!
//! Fetch methods on reflective models go through [`HttpTransport`], so the
//! runtime can be driven by the real client or by a test double.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Query and Form Arguments**: GET sends arguments as the query string,
//!   POST as a form-encoded body

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};

use crate::error::Result;
use crate::types::StringMap;
use async_trait::async_trait;

/// Transport used by fetch methods to retrieve response text
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` with `args` as query parameters
    async fn get_text(&self, url: &str, args: &StringMap) -> Result<String>;

    /// POST `args` to `url` as a form-encoded body
    async fn post_form(&self, url: &str, args: &StringMap) -> Result<String>;
}

#[cfg(test)]
mod tests;
