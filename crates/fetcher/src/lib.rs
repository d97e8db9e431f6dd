//! Network retrieval of remote assets (font stylesheets, font binaries, logos).
//!
//! This layer never retries, retry policies belong to whoever wraps an [`AssetFetcher`].

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	clippy::expect_used,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

mod error;
mod http;

pub use error::{FetchError, Result};
pub use http::{FetcherConfig, HttpFetcher, DEFAULT_USER_AGENT};

/// Fetch a URL, get bytes or fail.
///
/// Implementations must be `Send + Sync` as a single fetcher is shared by every request.
#[async_trait]
pub trait AssetFetcher: Send + Sync + 'static {
	async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;
}

#[async_trait]
impl<T: AssetFetcher + ?Sized> AssetFetcher for Arc<T> {
	async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
		(**self).fetch_bytes(url).await
	}
}
