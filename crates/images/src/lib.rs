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
	clippy::as_conversions,
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

//! Decoding and normalization of user supplied images (avatars, logos) before they get embedded
//! into a thumbnail document.

mod consts;
mod embed;
mod error;
mod generic;
mod handler;
mod svg;

pub use consts::EMBED_MAX_EDGE;
pub use embed::{data_uri, embeddable_data_uri, to_embeddable_jpeg, EMBED_MIME};
pub use error::{Error, Result};
pub use handler::{format_image, match_to_handler};
pub use image::DynamicImage;

pub trait ImageHandler: Send + Sync {
	fn maximum_size(&self) -> usize;

	fn validate_size(&self, data: &[u8]) -> Result<()> {
		if data.is_empty() {
			Err(Error::Empty)
		} else if data.len() > self.maximum_size() {
			Err(Error::TooLarge {
				size: data.len(),
				limit: self.maximum_size(),
			})
		} else {
			Ok(())
		}
	}

	fn handle_image(&self, data: &[u8]) -> Result<DynamicImage>;
}

/// Scales `(width, height)` so the longest edge equals `max_edge`, keeping the aspect ratio.
#[must_use]
#[allow(
	clippy::cast_precision_loss,
	clippy::cast_possible_truncation,
	clippy::cast_sign_loss,
	clippy::as_conversions
)]
pub fn scale_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
	let longest = width.max(height);
	if longest == 0 {
		return (0, 0);
	}

	let scale = max_edge as f64 / longest as f64;

	(
		((width as f64 * scale).round() as u32).max(1),
		((height as f64 * scale).round() as u32).max(1),
	)
}
