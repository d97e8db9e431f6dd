use std::time::Duration;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failures of a single network retrieval.
///
/// This type is `Clone` because a single in-flight fetch can be awaited by many callers at once.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
	#[error("request to <url='{url}'> failed with status {status}: {message}")]
	Status {
		url: String,
		status: u16,
		message: String,
	},
	#[error("transport error while fetching <url='{url}'>: {message}")]
	Transport { url: String, message: String },
	#[error("request to <url='{url}'> timed out after {after:?}")]
	Timeout { url: String, after: Duration },
	#[error("response from <url='{url}'> exceeded the limit of {limit} bytes")]
	TooLarge { url: String, limit: usize },
	#[error("failed to build the http client: {0}")]
	Client(String),
}

impl FetchError {
	pub(crate) fn from_reqwest(url: &str, e: &reqwest::Error, timeout: Duration) -> Self {
		if e.is_timeout() {
			Self::Timeout {
				url: url.to_owned(),
				after: timeout,
			}
		} else {
			Self::Transport {
				url: url.to_owned(),
				message: e.to_string(),
			}
		}
	}

	/// The HTTP status code, if the remote answered at all
	#[must_use]
	pub const fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
