use std::path::PathBuf;

use axum::{
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};
use tn_fonts::FontCacheError;
use tn_render::RenderError;
use tn_utils::FileIOError;
use tokio::task::JoinError;
use tracing::{debug, error};

pub type Result<T> = std::result::Result<T, ThumbnailError>;

#[derive(thiserror::Error, Debug)]
pub enum ThumbnailError {
	#[error("invalid assistant id: '{0}'")]
	InvalidId(String),
	#[error("assistant not found: {0}")]
	AssistantNotFound(String),
	/// Not a failure as far as the client is concerned, it gets sent elsewhere
	#[error("redirecting to '{location}'")]
	Redirect { location: String },

	#[error(transparent)]
	Fonts(#[from] FontCacheError),
	#[error(transparent)]
	Render(#[from] RenderError),
	#[error(transparent)]
	FileIO(#[from] FileIOError),
	#[error("malformed data in <path='{}'>: {message}", .path.display())]
	MalformedStore { path: PathBuf, message: String },
	#[error("invalid configuration: {0}")]
	Config(String),
	#[error("render task failed: {0}")]
	Task(#[from] JoinError),
}

impl IntoResponse for ThumbnailError {
	fn into_response(self) -> Response {
		match self {
			Self::InvalidId(id) => {
				debug!(%id, "400: Bad Request");
				(StatusCode::BAD_REQUEST, "Invalid assistant id.").into_response()
			}
			Self::AssistantNotFound(id) => {
				debug!(%id, "404: Not Found");
				(StatusCode::NOT_FOUND, "Assistant not found.").into_response()
			}
			Self::Redirect { location } => {
				debug!(%location, "302: Found");
				(StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
			}
			e => {
				error!(?e, "Failed to serve thumbnail: {e:#}");
				(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
			}
		}
	}
}
