use crate::{
	consts::{EMBED_MAX_EDGE, JPEG_QUALITY},
	format_image, Result,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{
	codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView, Rgb, RgbImage,
};
use tracing::debug;

pub const EMBED_MIME: &str = "image/jpeg";

/// Re-encodes any supported image as a compact JPEG, ready to be inlined in a document.
///
/// The result is at most [`EMBED_MAX_EDGE`] pixels on its longest edge, never upscaled, and
/// transparent areas become white, matching the card background.
pub fn to_embeddable_jpeg(data: &[u8]) -> Result<Vec<u8>> {
	let image = format_image(data)?;
	let (width, height) = image.dimensions();

	let image = if width.max(height) > EMBED_MAX_EDGE {
		image.resize(EMBED_MAX_EDGE, EMBED_MAX_EDGE, FilterType::Triangle)
	} else {
		image
	};

	let flattened = flatten_on_white(&image);

	let mut out = Vec::with_capacity(data.len().min(256 * 1024));
	JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY).encode_image(&flattened)?;

	debug!(
		original_size = data.len(),
		embedded_size = out.len(),
		width = flattened.width(),
		height = flattened.height(),
		"Normalized image for embedding"
	);

	Ok(out)
}

#[must_use]
pub fn data_uri(mime: &str, data: &[u8]) -> String {
	format!("data:{mime};base64,{}", STANDARD.encode(data))
}

pub fn embeddable_data_uri(data: &[u8]) -> Result<String> {
	to_embeddable_jpeg(data).map(|jpeg| data_uri(EMBED_MIME, &jpeg))
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn flatten_on_white(image: &DynamicImage) -> RgbImage {
	let rgba = image.to_rgba8();

	RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
		let [r, g, b, a] = rgba.get_pixel(x, y).0;
		let a = u16::from(a);
		let blend = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;

		Rgb([blend(r), blend(g), blend(b)])
	})
}
