use crate::{Result, ThumbnailError};

use tn_utils::FileIOError;

use std::{
	collections::HashMap,
	fmt,
	path::PathBuf,
	str::FromStr,
	sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{trace, warn};

/// Document database object id: 24 hex characters, kept lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssistantId(String);

impl AssistantId {
	pub const LEN: usize = 24;

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl FromStr for AssistantId {
	type Err = ThumbnailError;

	fn from_str(s: &str) -> Result<Self> {
		if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_hexdigit()) {
			Ok(Self(s.to_ascii_lowercase()))
		} else {
			Err(ThumbnailError::InvalidId(s.to_owned()))
		}
	}
}

impl TryFrom<String> for AssistantId {
	type Error = ThumbnailError;

	fn try_from(value: String) -> Result<Self> {
		value.parse()
	}
}

impl From<AssistantId> for String {
	fn from(id: AssistantId) -> Self {
		id.0
	}
}

impl fmt::Display for AssistantId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
	#[serde(alias = "_id")]
	pub id: AssistantId,
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default, alias = "createdByName")]
	pub created_by_name: Option<String>,
}

#[async_trait]
pub trait AssistantStore: Send + Sync + 'static {
	async fn find(&self, id: &AssistantId) -> Result<Option<Assistant>>;
}

/// Raw avatar binaries, in whatever format they were uploaded
#[async_trait]
pub trait AvatarStore: Send + Sync + 'static {
	async fn load(&self, id: &AssistantId) -> Result<Option<Bytes>>;
}

#[derive(Debug, Default)]
pub struct MemoryAssistantStore {
	assistants: HashMap<AssistantId, Assistant>,
}

impl MemoryAssistantStore {
	pub fn new(assistants: impl IntoIterator<Item = Assistant>) -> Self {
		Self {
			assistants: assistants
				.into_iter()
				.map(|assistant| (assistant.id.clone(), assistant))
				.collect(),
		}
	}
}

#[async_trait]
impl AssistantStore for MemoryAssistantStore {
	async fn find(&self, id: &AssistantId) -> Result<Option<Assistant>> {
		Ok(self.assistants.get(id).cloned())
	}
}

/// A JSON array of assistants, read again on every lookup so edits show up without a restart
#[derive(Debug, Clone)]
pub struct JsonAssistantStore {
	path: PathBuf,
}

impl JsonAssistantStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// A file that isn't there yet is an empty store, a fresh data directory has none
	async fn read_all(&self) -> Result<Vec<Assistant>> {
		let data = match fs::read(&self.path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				warn!(
					path = %self.path.display(),
					"Assistants file not found, no assistant will be found"
				);
				return Ok(vec![]);
			}
			Err(e) => {
				return Err(FileIOError::from((&self.path, e, "Failed to read assistants")).into())
			}
		};

		serde_json::from_slice(&data).map_err(|e| ThumbnailError::MalformedStore {
			path: self.path.clone(),
			message: e.to_string(),
		})
	}
}

#[async_trait]
impl AssistantStore for JsonAssistantStore {
	async fn find(&self, id: &AssistantId) -> Result<Option<Assistant>> {
		Ok(self
			.read_all()
			.await?
			.into_iter()
			.find(|assistant| &assistant.id == id))
	}
}

/// One file per assistant, named after its id, the way uploads are stored
#[derive(Debug, Clone)]
pub struct FsAvatarStore {
	directory: PathBuf,
}

impl FsAvatarStore {
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self {
			directory: directory.into(),
		}
	}

	#[must_use]
	pub fn path_for(&self, id: &AssistantId) -> PathBuf {
		self.directory.join(id.as_str())
	}
}

#[async_trait]
impl AvatarStore for FsAvatarStore {
	async fn load(&self, id: &AssistantId) -> Result<Option<Bytes>> {
		let path = self.path_for(id);

		match fs::read(&path).await {
			Ok(data) => {
				trace!(path = %path.display(), size = data.len(), "Loaded avatar");
				Ok(Some(data.into()))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(FileIOError::from((path, e, "Failed to read avatar")).into()),
		}
	}
}

/// For deployments where assistants never have avatars
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAvatars;

#[async_trait]
impl AvatarStore for NoAvatars {
	async fn load(&self, _: &AssistantId) -> Result<Option<Bytes>> {
		Ok(None)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
	/// Full id, usually `organization/name`
	pub id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default, alias = "logoUrl")]
	pub logo_url: Option<String>,
	#[serde(default)]
	pub unlisted: bool,
}

impl Model {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: None,
			logo_url: None,
			unlisted: false,
		}
	}

	/// What the thumbnail shows, the id unless a name was configured
	#[must_use]
	pub fn display_name(&self) -> &str {
		self.name
			.as_deref()
			.filter(|name| !name.trim().is_empty())
			.unwrap_or(&self.id)
	}
}

/// The configured models, looked up by exact id
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
	models: Arc<[Model]>,
}

impl ModelRegistry {
	pub fn new(models: impl IntoIterator<Item = Model>) -> Self {
		Self {
			models: models.into_iter().collect(),
		}
	}

	#[must_use]
	pub fn find(&self, id: &str) -> Option<&Model> {
		self.models.iter().find(|model| model.id == id)
	}

	/// Only models that may be shown publicly
	#[must_use]
	pub fn find_listed(&self, id: &str) -> Option<&Model> {
		self.find(id).filter(|model| !model.unlisted)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.models.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}
}
