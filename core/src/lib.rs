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

//! Share thumbnails for assistants and models.
//!
//! [`ThumbnailService`] ties the font cache, the asset fetcher and the entity stores to the
//! render pipeline, [`router`] puts it behind HTTP.

pub mod config;
pub mod error;
pub mod router;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{Result, ThumbnailError};
pub use router::router;
pub use service::ThumbnailService;
pub use store::{
	Assistant, AssistantId, AssistantStore, AvatarStore, FsAvatarStore, JsonAssistantStore,
	MemoryAssistantStore, Model, ModelRegistry, NoAvatars,
};
