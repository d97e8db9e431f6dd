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
	clippy::dbg_macro
)]
#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use std::fmt;

mod cache;
mod error;
mod persistent;
mod provider;

pub use cache::{FontCache, FontCacheConfig};
pub use error::{FontCacheError, Result};
pub use persistent::{PersistentTier, FONT_EXTENSION};
pub use provider::{select_font_url, FontProvider, DEFAULT_STYLESHEET_BASE};

/// Identifies a single font binary: a family at one exact weight
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontKey {
	pub family: String,
	pub weight: u16,
}

impl FontKey {
	pub fn new(family: impl Into<String>, weight: u16) -> Self {
		Self {
			family: family.into(),
			weight,
		}
	}

	/// Deterministic, filesystem safe name for this key, `Noto Sans` at 700 becomes `Noto_Sans-700`
	#[must_use]
	pub fn file_stem(&self) -> String {
		let family = self
			.family
			.chars()
			.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
			.collect::<String>();

		format!("{family}-{}", self.weight)
	}
}

impl fmt::Display for FontKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.family, self.weight)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn file_stem_is_filesystem_safe() {
		assert_eq!(FontKey::new("Inter", 400).file_stem(), "Inter-400");
		assert_eq!(FontKey::new("Noto Sans", 700).file_stem(), "Noto_Sans-700");
		assert_eq!(FontKey::new("../etc", 500).file_stem(), "___etc-500");
	}
}
