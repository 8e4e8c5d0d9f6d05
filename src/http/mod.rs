//! HTTP client functionality.
//!
//! - [`client`] - HTTP client creation and middleware configuration

pub mod client;

pub use client::{create_http_client, HttpClientConfig, USER_AGENT};
