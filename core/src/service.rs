use crate::{
	AssistantId, AssistantStore, AvatarStore, Config, FsAvatarStore, JsonAssistantStore,
	MemoryAssistantStore, ModelRegistry, NoAvatars, Result, ThumbnailError,
};

use tn_fetcher::AssetFetcher;
use tn_fonts::FontCache;
use tn_render::{
	AssistantCard, Document, FontSet, ModelCard, RenderPipeline, RenderRequest, Typography,
};

use std::sync::Arc;

use bytes::Bytes;
use futures_concurrency::future::Join;
use tokio::task::spawn_blocking;
use tracing::{debug, instrument, warn};

/// Renders the share thumbnails. Cheap to share behind an [`Arc`], every request goes through
/// the same font cache.
pub struct ThumbnailService {
	width: u32,
	height: u32,
	home: String,
	typography: Typography,
	weights: Vec<u16>,
	fonts: FontCache,
	fetcher: Arc<dyn AssetFetcher>,
	assistants: Arc<dyn AssistantStore>,
	avatars: Arc<dyn AvatarStore>,
	models: ModelRegistry,
	pipeline: Arc<RenderPipeline>,
}

impl ThumbnailService {
	/// Sets up the font cache and the stores named in `config`.
	///
	/// Without an assistants file every assistant is unknown, without an avatar directory every
	/// assistant gets the placeholder.
	pub async fn initialize(config: &Config, fetcher: Arc<dyn AssetFetcher>) -> Result<Self> {
		config.validate()?;

		let fonts = FontCache::initialize(config.font_cache(), Arc::clone(&fetcher)).await?;

		let assistants: Arc<dyn AssistantStore> = match &config.assistants_file {
			Some(path) => Arc::new(JsonAssistantStore::new(path)),
			None => Arc::new(MemoryAssistantStore::default()),
		};

		let avatars: Arc<dyn AvatarStore> = match &config.avatars_dir {
			Some(directory) => Arc::new(FsAvatarStore::new(directory)),
			None => Arc::new(NoAvatars),
		};

		let typography = config.typography();
		let mut weights = config.font_weights.clone();
		weights.extend(typography.weights());
		weights.sort_unstable();
		weights.dedup();

		Ok(Self {
			width: config.width,
			height: config.height,
			home: config.home(),
			typography,
			weights,
			fonts,
			fetcher,
			assistants,
			avatars,
			models: ModelRegistry::new(config.models.iter().cloned()),
			pipeline: Arc::new(RenderPipeline::new()),
		})
	}

	#[must_use]
	pub fn with_assistants(mut self, assistants: impl AssistantStore) -> Self {
		self.assistants = Arc::new(assistants);
		self
	}

	#[must_use]
	pub fn with_avatars(mut self, avatars: impl AvatarStore) -> Self {
		self.avatars = Arc::new(avatars);
		self
	}

	#[must_use]
	pub const fn font_cache(&self) -> &FontCache {
		&self.fonts
	}

	#[must_use]
	pub const fn models(&self) -> &ModelRegistry {
		&self.models
	}

	/// PNG thumbnail of an assistant, `assistant_id` straight from the request path
	#[instrument(skip(self))]
	pub async fn assistant_thumbnail(&self, assistant_id: &str) -> Result<Bytes> {
		let id = assistant_id.parse::<AssistantId>()?;

		let assistant = self
			.assistants
			.find(&id)
			.await?
			.ok_or_else(|| ThumbnailError::AssistantNotFound(id.to_string()))?;

		let (fonts, avatar) = (self.fonts(), self.avatar(&id)).join().await;

		let card = AssistantCard {
			name: assistant.name,
			description: assistant.description,
			created_by: assistant.created_by_name,
			avatar,
			typography: self.typography.clone(),
		};

		self.render(&card, fonts?).await
	}

	/// PNG thumbnail of a listed model. Unknown and unlisted models are sent home before any
	/// font gets resolved.
	#[instrument(skip(self))]
	pub async fn model_thumbnail(&self, model_id: &str) -> Result<Bytes> {
		let model = self
			.models
			.find_listed(model_id)
			.ok_or_else(|| ThumbnailError::Redirect {
				location: self.home.clone(),
			})?;

		let (fonts, logo) = (self.fonts(), self.logo(model.logo_url.as_deref()))
			.join()
			.await;

		let card = ModelCard {
			name: model.display_name().to_owned(),
			logo,
			typography: self.typography.clone(),
		};

		self.render(&card, fonts?).await
	}

	async fn fonts(&self) -> Result<FontSet> {
		let family = &self.typography.family;
		let weights = self
			.fonts
			.resolve_many(family, self.weights.iter().copied())
			.await?;

		Ok(FontSet::from_family(family.clone(), weights))
	}

	async fn avatar(&self, id: &AssistantId) -> Option<String> {
		match self.avatars.load(id).await {
			Ok(Some(data)) => embed(data, "avatar").await,
			Ok(None) => None,
			Err(e) => {
				warn!(%id, "Failed to load avatar, drawing the placeholder: {e:#}");
				None
			}
		}
	}

	async fn logo(&self, url: Option<&str>) -> Option<String> {
		let url = url.map(str::trim).filter(|url| !url.is_empty())?;

		match self.fetcher.fetch_bytes(url).await {
			Ok(data) => embed(data, "logo").await,
			Err(e) => {
				warn!(%url, "Failed to fetch logo, drawing the placeholder: {e:#}");
				None
			}
		}
	}

	async fn render(&self, document: &impl Document, fonts: FontSet) -> Result<Bytes> {
		let request = RenderRequest::new(document, self.width, self.height, fonts);
		let pipeline = Arc::clone(&self.pipeline);

		// Layout and rasterization are CPU bound, keep them off the async workers
		let image = spawn_blocking(move || pipeline.render(&request)).await??;

		debug!(size = image.png.len(), "Rendered thumbnail");

		Ok(image.png.into())
	}
}

/// Normalizes an uploaded or fetched image into an inline JPEG, `None` if it can't be decoded
async fn embed(data: Bytes, kind: &'static str) -> Option<String> {
	match spawn_blocking(move || tn_images::embeddable_data_uri(&data)).await {
		Ok(Ok(uri)) => Some(uri),
		Ok(Err(e)) => {
			warn!(kind, "Unusable image, drawing the placeholder: {e:#}");
			None
		}
		Err(e) => {
			warn!(kind, "Image normalization task failed, drawing the placeholder: {e:#}");
			None
		}
	}
}
