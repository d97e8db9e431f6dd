use tn_core::{
	router, Assistant, Config, MemoryAssistantStore, Model, ThumbnailError, ThumbnailService,
};
use tn_fetcher::{AssetFetcher, FetchError};

use std::{
	io::Cursor,
	path::Path,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
};

use async_trait::async_trait;
use axum::{
	body::{to_bytes, Body},
	http::{header, Request, StatusCode},
	response::Response,
};
use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use tracing_test::traced_test;

const FAMILY: &str = "DejaVu Sans";
const STYLESHEET_BASE: &str = "https://fonts.test";
const BINARY_BASE: &str = "https://static.fonts.test";
const LOGO_URL: &str = "https://logos.test/logo.png";
const BROKEN_LOGO_URL: &str = "https://logos.test/missing.png";

const ASSISTANT_ID: &str = "65a0f2b1c3d4e5f6a7b8c9d0";
const UNKNOWN_ID: &str = "ffffffffffffffffffffffff";

static REGULAR: &[u8] = include_bytes!("../../crates/render/tests/fixtures/DejaVuSans.ttf");
static BOLD: &[u8] = include_bytes!("../../crates/render/tests/fixtures/DejaVuSans-Bold.ttf");

/// Serves DejaVu Sans as if it were a font provider, plus a red logo
#[derive(Default)]
struct MockFetcher {
	calls: AtomicUsize,
	stylesheet_calls: AtomicUsize,
}

impl MockFetcher {
	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn stylesheet_calls(&self) -> usize {
		self.stylesheet_calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl AssetFetcher for MockFetcher {
	async fn fetch_bytes(&self, url: &str) -> Result<Bytes, FetchError> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if url.starts_with(STYLESHEET_BASE) {
			self.stylesheet_calls.fetch_add(1, Ordering::SeqCst);

			let weight = url
				.split("wght@")
				.nth(1)
				.and_then(|rest| rest.split('&').next())
				.unwrap_or_default();

			return Ok(Bytes::from(format!(
				"@font-face {{\n  font-family: '{FAMILY}';\n  font-style: normal;\n  \
				 font-weight: {weight};\n  src: url({BINARY_BASE}/{weight}.ttf) format('truetype');\n}}\n"
			)));
		}

		match url {
			"https://static.fonts.test/400.ttf" => Ok(Bytes::from_static(REGULAR)),
			"https://static.fonts.test/700.ttf" => Ok(Bytes::from_static(BOLD)),
			LOGO_URL => Ok(red_png()),
			_ => Err(FetchError::Status {
				url: url.to_owned(),
				status: 404,
				message: "Not Found".to_owned(),
			}),
		}
	}
}

fn red_png() -> Bytes {
	let mut png = Cursor::new(vec![]);
	RgbaImage::from_pixel(256, 256, Rgba([220, 30, 30, 255]))
		.write_to(&mut png, ImageFormat::Png)
		.unwrap();
	png.into_inner().into()
}

fn config(cache_dir: &Path) -> Config {
	Config {
		font_family: FAMILY.to_owned(),
		font_weights: vec![400, 700],
		font_cache_dir: Some(cache_dir.join("fonts")),
		font_provider: STYLESHEET_BASE.to_owned(),
		base_path: "/chat".to_owned(),
		models: vec![
			Model {
				logo_url: Some(LOGO_URL.to_owned()),
				..Model::new("mistralai/Mixtral-8x7B-Instruct-v0.1")
			},
			Model {
				logo_url: Some(BROKEN_LOGO_URL.to_owned()),
				..Model::new("meta-llama/Llama-3-70b")
			},
			Model {
				unlisted: true,
				..Model::new("secret/internal")
			},
		],
		..Config::default()
	}
}

fn assistant() -> Assistant {
	Assistant {
		id: ASSISTANT_ID.parse().unwrap(),
		name: "Writing Coach".to_owned(),
		description: Some("Feedback on essays and cover letters.".to_owned()),
		created_by_name: Some("ada".to_owned()),
	}
}

struct Harness {
	service: Arc<ThumbnailService>,
	fetcher: Arc<MockFetcher>,
	_dir: TempDir,
}

async fn harness(config: impl FnOnce(&Path) -> Config) -> Harness {
	let dir = tempdir().unwrap();
	let fetcher = Arc::new(MockFetcher::default());

	let service = ThumbnailService::initialize(&config(dir.path()), fetcher.clone())
		.await
		.unwrap()
		.with_assistants(MemoryAssistantStore::new([assistant()]));

	Harness {
		service: Arc::new(service),
		fetcher,
		_dir: dir,
	}
}

async fn get(service: &Arc<ThumbnailService>, uri: &str) -> Response {
	router(Arc::clone(service))
		.oneshot(Request::get(uri).body(Body::empty()).unwrap())
		.await
		.unwrap()
}

async fn body(response: Response) -> Bytes {
	to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

fn decode(png: &[u8]) -> RgbaImage {
	assert_eq!(image::guess_format(png).unwrap(), ImageFormat::Png);
	image::load_from_memory(png).unwrap().to_rgba8()
}

fn reddish(image: &RgbaImage) -> usize {
	image
		.pixels()
		.filter(|Rgba([r, g, b, _])| *r > 180 && *g < 90 && *b < 90)
		.count()
}

#[tokio::test]
#[traced_test]
async fn renders_known_assistants() {
	let Harness {
		service, fetcher, ..
	} = harness(config).await;

	let response = get(&service, &format!("/assistant/{ASSISTANT_ID}/thumbnail.png")).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

	let image = decode(&body(response).await);
	assert_eq!(image.dimensions(), (1200, 648));
	assert_eq!(*image.get_pixel(2, 2), Rgba([255, 255, 255, 255]));

	// Both weights, each a stylesheet and a binary
	assert_eq!(fetcher.calls(), 4);

	// Fonts are cached from now on
	let response = get(&service, &format!("/assistant/{ASSISTANT_ID}/thumbnail.png")).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(fetcher.calls(), 4);
}

#[tokio::test]
#[traced_test]
async fn unknown_assistants_are_not_found() {
	let Harness {
		service, fetcher, ..
	} = harness(config).await;

	let response = get(&service, &format!("/assistant/{UNKNOWN_ID}/thumbnail.png")).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(body(response).await, "Assistant not found.");
	assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
#[traced_test]
async fn malformed_ids_are_bad_requests() {
	let Harness {
		service, fetcher, ..
	} = harness(config).await;

	for id in ["not-an-id", "65a0f2b1c3d4e5f6a7b8c9d0aa", "zza0f2b1c3d4e5f6a7b8c9d0"] {
		let response = get(&service, &format!("/assistant/{id}/thumbnail.png")).await;
		assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{id}");
	}

	assert!(matches!(
		service.assistant_thumbnail("nope").await,
		Err(ThumbnailError::InvalidId(_))
	));
	assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
#[traced_test]
async fn unlisted_and_unknown_models_redirect_home() {
	let Harness {
		service, fetcher, ..
	} = harness(config).await;

	for model in ["secret/internal", "nobody/nothing"] {
		let response = get(&service, &format!("/models/{model}/thumbnail.png")).await;

		assert_eq!(response.status(), StatusCode::FOUND, "{model}");
		assert_eq!(response.headers()[header::LOCATION], "/chat/");
	}

	// Sent away before any font was looked at
	assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
#[traced_test]
async fn renders_listed_models_with_their_logo() {
	let Harness {
		service, fetcher, ..
	} = harness(config).await;

	let response = get(
		&service,
		"/models/mistralai/Mixtral-8x7B-Instruct-v0.1/thumbnail.png",
	)
	.await;

	assert_eq!(response.status(), StatusCode::OK);
	let image = decode(&body(response).await);
	assert_eq!(image.dimensions(), (1200, 648));
	assert!(reddish(&image) > 10_000);

	// Fonts plus the logo
	assert_eq!(fetcher.calls(), 5);
	assert_eq!(fetcher.stylesheet_calls(), 2);
}

#[tokio::test]
#[traced_test]
async fn broken_logos_fall_back_to_the_placeholder() {
	let Harness { service, .. } = harness(config).await;

	let response = get(&service, "/models/meta-llama/Llama-3-70b/thumbnail.png").await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(reddish(&decode(&body(response).await)), 0);
	assert!(logs_contain("Failed to fetch logo, drawing the placeholder"));
}

#[tokio::test]
#[traced_test]
async fn model_routes_must_end_in_the_thumbnail() {
	let Harness {
		service, fetcher, ..
	} = harness(config).await;

	let response = get(&service, "/models/mistralai/Mixtral-8x7B-Instruct-v0.1").await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
#[traced_test]
async fn avatars_are_embedded_and_bad_ones_ignored() {
	let avatars = tempdir().unwrap();
	let avatars_dir = avatars.path().to_path_buf();

	let Harness { service, .. } = harness(|cache_dir| Config {
		avatars_dir: Some(avatars_dir),
		..config(cache_dir)
	})
	.await;
	let uri = format!("/assistant/{ASSISTANT_ID}/thumbnail.png");

	tokio::fs::write(avatars.path().join(ASSISTANT_ID), red_png())
		.await
		.unwrap();
	let response = get(&service, &uri).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(reddish(&decode(&body(response).await)) > 10_000);

	tokio::fs::write(avatars.path().join(ASSISTANT_ID), b"definitely not an image")
		.await
		.unwrap();
	let response = get(&service, &uri).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(reddish(&decode(&body(response).await)), 0);
	assert!(logs_contain("Unusable image, drawing the placeholder"));
}

#[tokio::test]
#[traced_test]
async fn reads_assistants_from_a_json_file() {
	let dir = tempdir().unwrap();
	let assistants_file = dir.path().join("assistants.json");

	tokio::fs::write(
		&assistants_file,
		format!(r#"[{{ "_id": "{ASSISTANT_ID}", "name": "From disk" }}]"#),
	)
	.await
	.unwrap();

	let service = ThumbnailService::initialize(
		&Config {
			assistants_file: Some(assistants_file),
			..config(dir.path())
		},
		Arc::new(MockFetcher::default()),
	)
	.await
	.map(Arc::new)
	.unwrap();

	let response = get(&service, &format!("/assistant/{ASSISTANT_ID}/thumbnail.png")).await;
	assert_eq!(response.status(), StatusCode::OK);

	let response = get(&service, &format!("/assistant/{UNKNOWN_ID}/thumbnail.png")).await;
	assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[traced_test]
async fn fresh_data_dirs_have_no_assistants() {
	let dir = tempdir().unwrap();
	let data_dir = tempdir().unwrap();

	let config = config(dir.path()).with_data_dir(data_dir.path());
	assert_eq!(
		config.assistants_file.as_deref(),
		Some(data_dir.path().join("assistants.json").as_path())
	);

	let service = ThumbnailService::initialize(&config, Arc::new(MockFetcher::default()))
		.await
		.map(Arc::new)
		.unwrap();

	let response = get(&service, &format!("/assistant/{UNKNOWN_ID}/thumbnail.png")).await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(body(response).await, "Assistant not found.");
	assert!(logs_contain("Assistants file not found"));
}

#[tokio::test]
async fn font_failures_are_server_errors() {
	let dir = tempdir().unwrap();
	let service = ThumbnailService::initialize(
		&Config {
			font_weights: vec![400, 600],
			..config(dir.path())
		},
		Arc::new(MockFetcher::default()),
	)
	.await
	.map(Arc::new)
	.unwrap();

	let response = get(&service, "/models/mistralai/Mixtral-8x7B-Instruct-v0.1/thumbnail.png").await;

	// The mock advertises 600 but serves no binary for it
	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health() {
	let Harness { service, .. } = harness(config).await;

	let response = get(&service, "/health").await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body(response).await, "OK");
}
