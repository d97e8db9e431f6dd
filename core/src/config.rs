use crate::{Model, Result, ThumbnailError};

use tn_fetcher::{FetcherConfig, DEFAULT_USER_AGENT};
use tn_fonts::{FontCacheConfig, FontProvider, DEFAULT_STYLESHEET_BASE};
use tn_render::Typography;
use tn_utils::FileIOError;

use std::{
	env,
	path::{Path, PathBuf},
	time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

const FONT_CACHE_DIR_NAME: &str = "chat-ui-fonts";

/// Everything about the service that can be tuned, every field has a default so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub width: u32,
	pub height: u32,
	pub font_family: String,
	/// The lightest is used for regular text, the heaviest for titles
	pub font_weights: Vec<u16>,
	/// Defaults to a directory in the system temp dir
	pub font_cache_dir: Option<PathBuf>,
	/// Base URL of the font stylesheet provider
	pub font_provider: String,
	pub user_agent: String,
	pub fetch_timeout_secs: u64,
	/// Prefix the application is served under, redirects land on `{base_path}/`
	pub base_path: String,
	pub assistants_file: Option<PathBuf>,
	pub avatars_dir: Option<PathBuf>,
	pub models: Vec<Model>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			width: 1200,
			height: 648,
			font_family: "Inter".to_string(),
			font_weights: vec![500, 700],
			font_cache_dir: None,
			font_provider: DEFAULT_STYLESHEET_BASE.to_string(),
			user_agent: DEFAULT_USER_AGENT.to_string(),
			fetch_timeout_secs: 30,
			base_path: String::new(),
			assistants_file: None,
			avatars_dir: None,
			models: vec![],
		}
	}
}

impl Config {
	pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();

		let data = fs::read(path)
			.await
			.map_err(|e| FileIOError::from((path, e, "Failed to read config")))?;

		let config = serde_json::from_slice::<Self>(&data)
			.map_err(|e| ThumbnailError::Config(format!("{}: {e}", path.display())))?;

		config.validate()?;

		debug!(path = %path.display(), models = config.models.len(), "Loaded config");

		Ok(config)
	}

	/// Fills every unset location from a data directory: `fonts/`, `assistants.json` and
	/// `avatars/`. Explicitly configured locations are kept.
	#[must_use]
	pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
		let data_dir = data_dir.as_ref();

		self.font_cache_dir
			.get_or_insert_with(|| data_dir.join("fonts"));
		self.assistants_file
			.get_or_insert_with(|| data_dir.join("assistants.json"));
		self.avatars_dir
			.get_or_insert_with(|| data_dir.join("avatars"));

		self
	}

	pub fn validate(&self) -> Result<()> {
		if self.width == 0 || self.height == 0 {
			return Err(ThumbnailError::Config(format!(
				"thumbnail size must not be empty, got {}x{}",
				self.width, self.height
			)));
		}

		if self.font_family.trim().is_empty() {
			return Err(ThumbnailError::Config("font_family is empty".to_string()));
		}

		if self.font_weights.is_empty() {
			return Err(ThumbnailError::Config("font_weights is empty".to_string()));
		}

		if let Some(weight) = self
			.font_weights
			.iter()
			.find(|weight| !(1..=1000).contains(*weight))
		{
			return Err(ThumbnailError::Config(format!(
				"font weight {weight} is out of range"
			)));
		}

		Ok(())
	}

	#[must_use]
	pub fn font_cache_dir(&self) -> PathBuf {
		self.font_cache_dir
			.clone()
			.unwrap_or_else(|| env::temp_dir().join(FONT_CACHE_DIR_NAME))
	}

	#[must_use]
	pub fn font_cache(&self) -> FontCacheConfig {
		FontCacheConfig::new(self.font_cache_dir())
			.with_provider(FontProvider::new(self.font_provider.clone()))
	}

	#[must_use]
	pub fn fetcher(&self) -> FetcherConfig {
		FetcherConfig::default()
			.with_user_agent(self.user_agent.clone())
			.with_timeout(Duration::from_secs(self.fetch_timeout_secs))
	}

	#[must_use]
	pub fn typography(&self) -> Typography {
		let regular = self.font_weights.iter().copied().min().unwrap_or(400);
		let bold = self.font_weights.iter().copied().max().unwrap_or(700);

		Typography::new(self.font_family.trim(), regular, bold)
	}

	/// Where unlisted and unknown models are sent
	#[must_use]
	pub fn home(&self) -> String {
		format!("{}/", self.base_path.trim_end_matches('/'))
	}
}
