use crate::{
	consts::{SVG_MAXIMUM_FILE_SIZE, SVG_TARGET_PX},
	scale_dimensions, Error, ImageHandler, Result,
};

use image::DynamicImage;
use resvg::{tiny_skia, usvg};

#[derive(PartialEq, Eq)]
pub struct SvgHandler {}

impl ImageHandler for SvgHandler {
	fn maximum_size(&self) -> usize {
		SVG_MAXIMUM_FILE_SIZE
	}

	#[allow(
		clippy::cast_precision_loss,
		clippy::cast_possible_truncation,
		clippy::cast_sign_loss,
		clippy::as_conversions
	)]
	fn handle_image(&self, data: &[u8]) -> Result<DynamicImage> {
		self.validate_size(data)?;

		// No fonts on purpose, text inside an avatar is not something we promise to render
		let options = usvg::Options::default();
		let tree = usvg::Tree::from_data(data, &options)?;

		let (width, height) = scale_dimensions(
			tree.size().width().ceil() as u32,
			tree.size().height().ceil() as u32,
			SVG_TARGET_PX,
		);
		if width == 0 || height == 0 {
			return Err(Error::InvalidLength);
		}

		let transform = tiny_skia::Transform::from_scale(
			width as f32 / tree.size().width(),
			height as f32 / tree.size().height(),
		);

		let Some(mut pixmap) = tiny_skia::Pixmap::new(width, height) else {
			return Err(Error::Pixbuf);
		};

		resvg::render(&tree, transform, &mut pixmap.as_mut());

		let pixels = pixmap
			.pixels()
			.iter()
			.flat_map(|pixel| {
				let color = pixel.demultiply();
				[color.red(), color.green(), color.blue(), color.alpha()]
			})
			.collect();

		image::RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixels).map_or_else(
			|| Err(Error::RgbImageConversion),
			|x| Ok(DynamicImage::ImageRgba8(x)),
		)
	}
}
