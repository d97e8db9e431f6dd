use crate::{select_font_url, FontCacheError, FontKey, FontProvider, PersistentTier, Result};

use tn_fetcher::AssetFetcher;
use tn_utils::report_warning;

use std::{
	collections::{BTreeMap, BTreeSet, HashMap},
	path::PathBuf,
	sync::Arc,
};

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures_concurrency::future::Join;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, trace};

type SharedLoad = Shared<BoxFuture<'static, Result<Bytes>>>;

#[derive(Debug, Clone)]
pub struct FontCacheConfig {
	/// Persistent tier location, created on [`FontCache::initialize`]
	pub directory: PathBuf,
	pub provider: FontProvider,
}

impl FontCacheConfig {
	pub fn new(directory: impl Into<PathBuf>) -> Self {
		Self {
			directory: directory.into(),
			provider: FontProvider::default(),
		}
	}

	#[must_use]
	pub fn with_provider(mut self, provider: FontProvider) -> Self {
		self.provider = provider;
		self
	}
}

/// Two tier cache of font binaries keyed by (family, weight).
///
/// Lookups go memory, then disk, then the font provider. Concurrent lookups of the same missing
/// key share a single load. Cloning is cheap, every clone talks to the same tiers.
#[derive(Clone)]
pub struct FontCache {
	inner: Arc<Inner>,
}

struct Inner {
	fetcher: Arc<dyn AssetFetcher>,
	provider: FontProvider,
	persistent: PersistentTier,
	memory: RwLock<HashMap<FontKey, Bytes>>,
	in_flight: Mutex<HashMap<FontKey, SharedLoad>>,
}

impl FontCache {
	pub async fn initialize(
		FontCacheConfig {
			directory,
			provider,
		}: FontCacheConfig,
		fetcher: Arc<dyn AssetFetcher>,
	) -> Result<Self> {
		let persistent = PersistentTier::initialize(&directory).await?;

		debug!(directory = %directory.display(), "Font cache ready");

		Ok(Self {
			inner: Arc::new(Inner {
				fetcher,
				provider,
				persistent,
				memory: RwLock::default(),
				in_flight: Mutex::default(),
			}),
		})
	}

	#[instrument(skip(self), err)]
	pub async fn resolve_one(&self, family: &str, weight: u16) -> Result<Bytes> {
		let key = FontKey::new(family, weight);

		let cached = self.inner.memory.read().await.get(&key).cloned();
		if let Some(bytes) = cached {
			trace!("Font found in memory");
			return Ok(bytes);
		}

		let load = {
			let mut in_flight = self.inner.in_flight.lock().await;

			if let Some(load) = in_flight.get(&key) {
				debug!("Joining an in-flight font load");
				load.clone()
			} else {
				// Spawned so the load always runs to completion, even if every caller goes away
				let handle = tokio::spawn(Arc::clone(&self.inner).load(key.clone()));

				let load = async move {
					handle
						.await
						.unwrap_or_else(|e| Err(FontCacheError::Task(e.to_string())))
				}
				.boxed()
				.shared();

				in_flight.insert(key, load.clone());
				load
			}
		};

		load.await
	}

	/// Resolves every weight concurrently, all of them or nothing.
	///
	/// A render missing one weight would be visually wrong, so one failure fails the whole call
	/// and no partial map is returned. Weights resolved before the failure stay cached.
	pub async fn resolve_many(
		&self,
		family: &str,
		weights: impl IntoIterator<Item = u16>,
	) -> Result<BTreeMap<u16, Bytes>> {
		let weights = weights.into_iter().collect::<BTreeSet<_>>();

		weights
			.into_iter()
			.map(|weight| async move { (weight, self.resolve_one(family, weight).await) })
			.collect::<Vec<_>>()
			.join()
			.await
			.into_iter()
			.map(|(weight, res)| res.map(|bytes| (weight, bytes)))
			.collect()
	}

	pub async fn cached_in_memory(&self, key: &FontKey) -> bool {
		self.inner.memory.read().await.contains_key(key)
	}

	#[must_use]
	pub fn persistent(&self) -> &PersistentTier {
		&self.inner.persistent
	}
}

impl Inner {
	async fn load(self: Arc<Self>, key: FontKey) -> Result<Bytes> {
		let res = self.load_uncached(&key).await;

		// Success or failure, the next caller must start from scratch
		self.in_flight.lock().await.remove(&key);

		res
	}

	async fn load_uncached(&self, key: &FontKey) -> Result<Bytes> {
		// Someone may have finished this key between our memory check and getting here
		let cached = self.memory.read().await.get(key).cloned();
		if let Some(bytes) = cached {
			return Ok(bytes);
		}

		if let Some(bytes) = self.persistent.read(key).await {
			debug!(%key, "Font found on disk");
			self.memory.write().await.insert(key.clone(), bytes.clone());
			return Ok(bytes);
		}

		let bytes = self.download(key).await?;

		// Durability is only an optimization here
		report_warning(&self.persistent.write(key, &bytes).await);

		self.memory.write().await.insert(key.clone(), bytes.clone());

		debug!(%key, size = bytes.len(), "Downloaded font");

		Ok(bytes)
	}

	async fn download(&self, key: &FontKey) -> Result<Bytes> {
		let stylesheet_url = self.provider.stylesheet_url(&key.family, [key.weight]);
		let stylesheet = self.fetcher.fetch_bytes(&stylesheet_url).await?;

		let font_url = select_font_url(&String::from_utf8_lossy(&stylesheet), key.weight)
			.ok_or_else(|| FontCacheError::WeightNotFound {
				family: key.family.clone(),
				weight: key.weight,
			})?;

		trace!(%key, %font_url, "Resolved font binary url");

		Ok(self.fetcher.fetch_bytes(&font_url).await?)
	}
}
