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

//! Turns a markup snapshot plus a set of font binaries into a PNG.
//!
//! Rendering goes through three strictly ordered stages:
//! 1. document synthesis, a [`Document`] produces a self-contained [`MarkupSnapshot`];
//! 2. vector synthesis, the [`VectorSynthesizer`] lays the snapshot out at a fixed size and
//!    emits SVG, refusing to go on if a font the document needs was not supplied;
//! 3. raster synthesis, a [`Rasterizer`] turns the SVG into PNG bytes at the same size.

mod document;
mod error;
mod fonts;
mod layout;
mod markup;
mod pipeline;
mod raster;
mod style;
mod text;
mod vector;

pub use document::{AssistantCard, Document, ModelCard, Typography};
pub use error::{RenderError, Result};
pub use fonts::FontSet;
pub use markup::MarkupSnapshot;
pub use pipeline::{RasterImage, RenderPipeline, RenderRequest};
pub use raster::{Rasterizer, ResvgRasterizer};
pub use vector::{VectorGraphic, VectorSynthesizer};
