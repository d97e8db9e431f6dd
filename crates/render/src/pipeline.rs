use crate::{
	Document, FontSet, MarkupSnapshot, Rasterizer, RenderError, ResvgRasterizer, Result,
	VectorSynthesizer,
};

use tracing::{debug, instrument};

/// Everything a single render needs, nothing else is reachable while rendering
#[derive(Debug, Clone)]
pub struct RenderRequest {
	pub document: MarkupSnapshot,
	pub width: u32,
	pub height: u32,
	pub fonts: FontSet,
}

impl RenderRequest {
	pub fn new(document: &impl Document, width: u32, height: u32, fonts: FontSet) -> Self {
		Self {
			document: document.snapshot(),
			width,
			height,
			fonts,
		}
	}
}

/// PNG bytes, owned by whoever asked for them and never cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
	pub png: Vec<u8>,
	pub width: u32,
	pub height: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RenderPipeline<R = ResvgRasterizer> {
	synthesizer: VectorSynthesizer,
	rasterizer: R,
}

impl RenderPipeline {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl<R: Rasterizer> RenderPipeline<R> {
	pub fn with_rasterizer(rasterizer: R) -> Self {
		Self {
			synthesizer: VectorSynthesizer::default(),
			rasterizer,
		}
	}

	#[must_use]
	pub fn with_synthesizer(mut self, synthesizer: VectorSynthesizer) -> Self {
		self.synthesizer = synthesizer;
		self
	}

	pub fn rasterizer(&self) -> &R {
		&self.rasterizer
	}

	/// Vector synthesis, then raster synthesis. A failed stage stops everything after it.
	#[instrument(skip_all, fields(width = request.width, height = request.height), err)]
	pub fn render(&self, request: &RenderRequest) -> Result<RasterImage> {
		let RenderRequest {
			document,
			width,
			height,
			fonts,
		} = request;

		if *width == 0 || *height == 0 {
			return Err(RenderError::InvalidSize {
				width: *width,
				height: *height,
			});
		}

		let graphic = self
			.synthesizer
			.synthesize(document, *width, *height, fonts)?;

		let image = self.rasterizer.rasterize(&graphic, fonts)?;

		debug!(png_size = image.png.len(), "Rendered raster image");

		Ok(image)
	}
}
