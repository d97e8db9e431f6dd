use std::sync::Arc;

use tn_fetcher::FetchError;
use tn_utils::FileIOError;

pub type Result<T> = std::result::Result<T, FontCacheError>;

/// Everything that can go wrong while resolving a font.
///
/// Has to be `Clone` as every caller attached to the same in-flight load receives its own copy.
#[derive(thiserror::Error, Debug, Clone)]
pub enum FontCacheError {
	#[error("font not found: {family} weight {weight}")]
	WeightNotFound { family: String, weight: u16 },
	#[error(transparent)]
	Fetch(#[from] FetchError),
	#[error("failed to initialize the font cache: {0}")]
	Init(Arc<FileIOError>),
	#[error("font loading task failed: {0}")]
	Task(String),
}

impl From<FileIOError> for FontCacheError {
	fn from(e: FileIOError) -> Self {
		Self::Init(Arc::new(e))
	}
}
