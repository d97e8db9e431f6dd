use crate::{FontSet, RasterImage, RenderError, Result, VectorGraphic};

use std::{io::Cursor, sync::Arc};

use image::{ImageFormat, RgbaImage};
use resvg::{
	tiny_skia,
	usvg::{self, fontdb},
};
use tracing::{instrument, trace};

/// Last stage of the pipeline, a vector graphic in, PNG bytes out at the very same size.
pub trait Rasterizer: Send + Sync {
	fn rasterize(&self, graphic: &VectorGraphic, fonts: &FontSet) -> Result<RasterImage>;
}

/// Rasterizes with `resvg`, seeing no fonts but the supplied ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgRasterizer;

impl ResvgRasterizer {
	/// System fonts never get in, whatever is installed on the host can't change a thumbnail
	fn font_database(fonts: &FontSet) -> Result<fontdb::Database> {
		let mut database = fontdb::Database::new();

		for (family, weight, data) in fonts.iter() {
			let ids = database.load_font_source(fontdb::Source::Binary(Arc::new(data.clone())));

			if ids.is_empty() {
				return Err(RenderError::InvalidFont {
					family: family.to_owned(),
					weight,
				});
			}

			for id in ids.iter().copied() {
				let Some(face) = database.face(id) else {
					continue;
				};

				let declares_family = face.families.iter().any(|(name, _)| name == family);
				if !declares_family || face.weight.0 != weight {
					return Err(RenderError::FontMismatch {
						family: family.to_owned(),
						weight,
						found: format!(
							"'{}' weight {}",
							face.families
								.first()
								.map_or("<unnamed>", |(name, _)| name.as_str()),
							face.weight.0
						),
					});
				}
			}

			trace!(%family, weight, "Loaded font for rasterization");
		}

		Ok(database)
	}
}

impl Rasterizer for ResvgRasterizer {
	#[instrument(skip_all, fields(width = graphic.width(), height = graphic.height()), err)]
	fn rasterize(&self, graphic: &VectorGraphic, fonts: &FontSet) -> Result<RasterImage> {
		let mut options = usvg::Options::default();
		if let Some(family) = fonts.default_family() {
			family.clone_into(&mut options.font_family);
		}
		options.fontdb = Arc::new(Self::font_database(fonts)?);

		let tree = usvg::Tree::from_str(graphic.svg(), &options)?;

		let (width, height) = (graphic.width(), graphic.height());
		let mut pixmap = tiny_skia::Pixmap::new(width, height)
			.ok_or(RenderError::Pixmap { width, height })?;

		// Original size, no fitting
		resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

		let pixels = pixmap
			.pixels()
			.iter()
			.flat_map(|pixel| {
				let color = pixel.demultiply();
				[color.red(), color.green(), color.blue(), color.alpha()]
			})
			.collect();

		let image = RgbaImage::from_raw(width, height, pixels)
			.ok_or(RenderError::Pixmap { width, height })?;

		let mut png = Cursor::new(Vec::new());
		image.write_to(&mut png, ImageFormat::Png)?;

		Ok(RasterImage {
			png: png.into_inner(),
			width,
			height,
		})
	}
}
