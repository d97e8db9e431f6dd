use crate::FontKey;

use tn_utils::FileIOError;

use std::{
	io,
	path::{Path, PathBuf},
};

use bytes::Bytes;
use tokio::fs;
use tracing::{trace, warn};
use uuid::Uuid;

/// We ask providers for TrueType, so that's what lands on disk
pub const FONT_EXTENSION: &str = "ttf";

/// Durable tier of the font cache, one raw font binary per [`FontKey`] inside a single directory.
///
/// Nothing here is ever evicted.
#[derive(Debug, Clone)]
pub struct PersistentTier {
	directory: PathBuf,
}

impl PersistentTier {
	/// Creates the cache directory if needed and makes sure it really is a directory
	pub async fn initialize(directory: impl AsRef<Path>) -> Result<Self, FileIOError> {
		let directory = directory.as_ref().to_path_buf();

		fs::create_dir_all(&directory)
			.await
			.map_err(|e| FileIOError::from((&directory, e, "creating font cache directory")))?;

		let metadata = fs::metadata(&directory)
			.await
			.map_err(|e| FileIOError::from((&directory, e, "inspecting font cache directory")))?;

		if !metadata.is_dir() {
			return Err(FileIOError::from((
				&directory,
				io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
				"inspecting font cache directory",
			)));
		}

		Ok(Self { directory })
	}

	#[must_use]
	pub fn directory(&self) -> &Path {
		&self.directory
	}

	#[must_use]
	pub fn path_for(&self, key: &FontKey) -> PathBuf {
		let mut path = self.directory.join(key.file_stem());
		path.set_extension(FONT_EXTENSION);
		path
	}

	/// A missing, empty or unreadable file is a miss, the font will just be downloaded again
	pub async fn read(&self, key: &FontKey) -> Option<Bytes> {
		let path = self.path_for(key);

		match fs::read(&path).await {
			Ok(data) if data.is_empty() => {
				warn!(path = %path.display(), "Ignoring empty cached font file");
				None
			}
			Ok(data) => {
				trace!(path = %path.display(), "Read cached font file");
				Some(Bytes::from(data))
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => None,
			Err(e) => {
				warn!(
					"{:#}",
					FileIOError::from((&path, e, "reading cached font, treating it as a miss"))
				);
				None
			}
		}
	}

	/// Writes to a unique temporary sibling first and renames it into place, so concurrent
	/// writers of the same key never leave a torn file behind. The last rename wins, and as font
	/// binaries are immutable per key all writers carry the same content anyway.
	pub async fn write(&self, key: &FontKey, data: &[u8]) -> Result<(), FileIOError> {
		let path = self.path_for(key);
		let temp_path = self
			.directory
			.join(format!(".{}.{}.tmp", key.file_stem(), Uuid::new_v4()));

		if let Err(e) = fs::write(&temp_path, data).await {
			// It may have been partially created
			let _ = fs::remove_file(&temp_path).await;
			return Err(FileIOError::from((
				&temp_path,
				e,
				"writing temporary font file",
			)));
		}

		if let Err(e) = fs::rename(&temp_path, &path).await {
			let _ = fs::remove_file(&temp_path).await;
			return Err(FileIOError::from((&path, e, "moving font file into place")));
		}

		trace!(path = %path.display(), "Persisted font file");

		Ok(())
	}
}
