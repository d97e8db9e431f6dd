use crate::{ThumbnailError, ThumbnailService};

use std::sync::Arc;

use axum::{
	extract::{Path, State},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	routing::get,
	Router,
};
use bytes::Bytes;

const THUMBNAIL_SUFFIX: &str = "/thumbnail.png";

pub fn router(service: Arc<ThumbnailService>) -> Router {
	Router::new()
		.route(
			"/assistant/:assistant_id/thumbnail.png",
			get(
				|State(service): State<Arc<ThumbnailService>>,
				 Path(assistant_id): Path<String>| async move {
					service
						.assistant_thumbnail(&assistant_id)
						.await
						.map(png)
				},
			),
		)
		// Model ids contain slashes, so the whole rest of the path is captured
		.route(
			"/models/*model",
			get(
				|State(service): State<Arc<ThumbnailService>>,
				 Path(path): Path<String>| async move {
					let Some(model_id) = path.strip_suffix(THUMBNAIL_SUFFIX) else {
						return Ok::<_, ThumbnailError>(not_found());
					};

					service.model_thumbnail(model_id).await.map(png)
				},
			),
		)
		.route("/health", get(|| async { "OK" }))
		.fallback(|| async { not_found() })
		.with_state(service)
}

fn png(data: Bytes) -> Response {
	([(header::CONTENT_TYPE, "image/png")], data).into_response()
}

fn not_found() -> Response {
	(StatusCode::NOT_FOUND, "Not Found").into_response()
}
