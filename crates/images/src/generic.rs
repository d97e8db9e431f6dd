use crate::{consts::GENERIC_MAXIMUM_FILE_SIZE, ImageHandler, Result};

use image::DynamicImage;

/// Anything the `image` crate can decode: PNG, JPEG, GIF, WebP, BMP, ICO...
pub struct GenericHandler {}

impl ImageHandler for GenericHandler {
	fn maximum_size(&self) -> usize {
		GENERIC_MAXIMUM_FILE_SIZE
	}

	fn handle_image(&self, data: &[u8]) -> Result<DynamicImage> {
		self.validate_size(data)?;
		Ok(image::load_from_memory(data)?)
	}
}
