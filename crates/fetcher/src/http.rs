use crate::{AssetFetcher, FetchError, Result};

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tracing::{instrument, trace};

/// Client identity sent with every request.
///
/// Font providers pick the binary container from this header, modern browsers get WOFF2 which
/// the rasterizer can't parse, while this older desktop identity gets plain TrueType.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_6_8; en-us) \
	AppleWebKit/533.21.1 (KHTML, like Gecko) Version/5.0.5 Safari/533.21.1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 20 MiB, way more than any font or avatar we'd accept
const DEFAULT_MAX_BODY_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
	pub user_agent: String,
	/// Upper bound for a whole request, from connecting to the last body byte
	pub timeout: Duration,
	pub connect_timeout: Duration,
	pub max_body_size: usize,
}

impl Default for FetcherConfig {
	fn default() -> Self {
		Self {
			user_agent: DEFAULT_USER_AGENT.to_string(),
			timeout: DEFAULT_TIMEOUT,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			max_body_size: DEFAULT_MAX_BODY_SIZE,
		}
	}
}

impl FetcherConfig {
	#[must_use]
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();
		self
	}

	#[must_use]
	pub const fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	#[must_use]
	pub const fn with_max_body_size(mut self, max_body_size: usize) -> Self {
		self.max_body_size = max_body_size;
		self
	}
}

/// Default [`AssetFetcher`], a thin layer over a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
	client: reqwest::Client,
	config: FetcherConfig,
}

impl HttpFetcher {
	pub fn new(config: FetcherConfig) -> Result<Self> {
		let client = reqwest::Client::builder()
			.user_agent(config.user_agent.clone())
			.timeout(config.timeout)
			.connect_timeout(config.connect_timeout)
			.build()
			.map_err(|e| FetchError::Client(e.to_string()))?;

		Ok(Self { client, config })
	}

	#[must_use]
	pub const fn config(&self) -> &FetcherConfig {
		&self.config
	}
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
	#[instrument(skip(self), err)]
	async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
		let timeout = self.config.timeout;
		let limit = self.config.max_body_size;

		let mut response = self
			.client
			.get(url)
			.send()
			.await
			.map_err(|e| FetchError::from_reqwest(url, &e, timeout))?;

		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::Status {
				url: url.to_owned(),
				status: status.as_u16(),
				message: status
					.canonical_reason()
					.unwrap_or("unknown status")
					.to_owned(),
			});
		}

		if response
			.content_length()
			.is_some_and(|len| len > limit as u64)
		{
			return Err(FetchError::TooLarge {
				url: url.to_owned(),
				limit,
			});
		}

		let mut body = BytesMut::new();
		while let Some(chunk) = response
			.chunk()
			.await
			.map_err(|e| FetchError::from_reqwest(url, &e, timeout))?
		{
			if body.len() + chunk.len() > limit {
				return Err(FetchError::TooLarge {
					url: url.to_owned(),
					limit,
				});
			}
			body.extend_from_slice(&chunk);
		}

		if body.is_empty() {
			return Err(FetchError::Transport {
				url: url.to_owned(),
				message: "empty response body".to_string(),
			});
		}

		trace!(size = body.len(), "Fetched asset");

		Ok(body.freeze())
	}
}
