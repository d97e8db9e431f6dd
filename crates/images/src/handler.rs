use crate::{consts, generic::GenericHandler, svg::SvgHandler, Error, ImageHandler, Result};

use image::{DynamicImage, ImageFormat};
use tracing::trace;

/// Decodes an image of any supported format, sniffed from its content
pub fn format_image(data: &[u8]) -> Result<DynamicImage> {
	match_to_handler(data)?.handle_image(data)
}

/// We get raw bytes without a trustworthy name, so the content decides
pub fn match_to_handler(data: &[u8]) -> Result<Box<dyn ImageHandler>> {
	if data.is_empty() {
		return Err(Error::Empty);
	}

	if looks_like_svg(data) {
		trace!("Sniffed an SVG image");
		return Ok(Box::new(SvgHandler {}));
	}

	match image::guess_format(data) {
		Ok(format) if is_generic(format) => {
			trace!(?format, "Sniffed a raster image");
			Ok(Box::new(GenericHandler {}))
		}
		_ => Err(Error::Unsupported),
	}
}

fn is_generic(format: ImageFormat) -> bool {
	matches!(
		format,
		ImageFormat::Png
			| ImageFormat::Jpeg
			| ImageFormat::Gif
			| ImageFormat::WebP
			| ImageFormat::Bmp
			| ImageFormat::Ico
			| ImageFormat::Tiff
			| ImageFormat::Tga
			| ImageFormat::Qoi
	)
}

fn looks_like_svg(data: &[u8]) -> bool {
	// Only the head matters, and it may carry a BOM or leading whitespace
	let head = &data[..data.len().min(1024)];
	let head = String::from_utf8_lossy(head);
	let head = head.trim_start_matches('\u{feff}').trim_start();

	consts::SVG_SIGNATURES
		.iter()
		.any(|signature| head.starts_with(signature))
		&& (head.starts_with("<svg") || head.contains("<svg"))
}
