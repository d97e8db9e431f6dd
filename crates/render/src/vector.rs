use crate::{
	layout::{Content, LayoutBox, LayoutContext, StyledChild, StyledNode},
	markup::escape,
	style::{Color, ComputedStyle, Stylesheet},
	text::{TextBlock, TextMeasurer},
	FontSet, MarkupSnapshot, RenderError, Result,
};

use std::fmt::Write;

use tracing::{debug, instrument};

/// Used when the font set is empty, so the missing font error has a name to report
const FALLBACK_FAMILY: &str = "sans-serif";

/// An SVG document at a fixed pixel size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorGraphic {
	svg: String,
	width: u32,
	height: u32,
}

impl VectorGraphic {
	#[must_use]
	pub fn svg(&self) -> &str {
		&self.svg
	}

	#[must_use]
	pub const fn width(&self) -> u32 {
		self.width
	}

	#[must_use]
	pub const fn height(&self) -> u32 {
		self.height
	}

	#[must_use]
	pub fn into_svg(self) -> String {
		self.svg
	}
}

#[derive(Debug, Clone)]
pub struct VectorSynthesizer {
	default_font_size: f32,
}

impl Default for VectorSynthesizer {
	fn default() -> Self {
		Self {
			default_font_size: 16.0,
		}
	}
}

impl VectorSynthesizer {
	#[must_use]
	pub fn with_default_font_size(mut self, size: f32) -> Self {
		self.default_font_size = size;
		self
	}

	/// Lays `document` out on a `width` x `height` canvas and draws it as SVG.
	///
	/// Fails before any layout work if the document uses a font that isn't in `fonts` or points
	/// at anything that isn't inlined.
	#[instrument(skip(self, document, fonts), fields(font_count = fonts.len()), err)]
	pub fn synthesize(
		&self,
		document: &MarkupSnapshot,
		width: u32,
		height: u32,
		fonts: &FontSet,
	) -> Result<VectorGraphic> {
		let (root, embedded) = document.parse_body()?;

		let mut sheet = Stylesheet::parse(&document.style);
		for css in &embedded {
			sheet.extend(css);
		}

		let root_style = ComputedStyle::root(
			fonts.default_family().unwrap_or(FALLBACK_FAMILY),
			self.default_font_size,
		);
		let styled = StyledNode::build(&root, &sheet, &root_style);

		verify_fonts(&styled, fonts)?;
		verify_resources(&styled)?;

		let measurer = TextMeasurer::new(fonts)?;
		let layout = LayoutContext::new(&measurer).layout_root(
			&styled,
			to_f32(width),
			to_f32(height),
		)?;

		let svg = SvgWriter::default().finish(&layout, width, height);

		debug!(svg_size = svg.len(), "Synthesized vector graphic");

		Ok(VectorGraphic { svg, width, height })
	}
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn to_f32(value: u32) -> f32 {
	value as f32
}

/// Every face a text run is drawn with, or that a style asks for by name, must be supplied.
/// Nothing gets substituted.
fn verify_fonts(root: &StyledNode, fonts: &FontSet) -> Result<()> {
	let mut missing = None;

	root.walk(&mut |node| {
		if missing.is_some() {
			return;
		}

		let has_text = node.children.iter().any(|child| {
			matches!(child, StyledChild::Text(text) if !text.trim().is_empty())
		});

		if (has_text || node.style.declares_font)
			&& !fonts.contains(&node.style.font_family, node.style.font_weight)
		{
			missing = Some(RenderError::MissingFont {
				family: node.style.font_family.clone(),
				weight: node.style.font_weight,
			});
		}
	});

	missing.map_or(Ok(()), Err)
}

fn verify_resources(root: &StyledNode) -> Result<()> {
	let mut external = None;

	root.walk(&mut |node| {
		if external.is_some() || !node.is_image() {
			return;
		}

		match node.src.as_deref() {
			Some(src) if src.trim_start().starts_with("data:") => {}
			Some(src) => external = Some(RenderError::ExternalResource(src.to_owned())),
			None => {
				external = Some(RenderError::MalformedDocument(
					"image without a source".to_owned(),
				));
			}
		}
	});

	external.map_or(Ok(()), Err)
}

#[derive(Default)]
struct SvgWriter {
	out: String,
	clip_ids: usize,
}

impl SvgWriter {
	fn finish(mut self, root: &LayoutBox, width: u32, height: u32) -> String {
		write!(
			self.out,
			r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
		).ok();
		self.paint(root, 0.0, 0.0);
		self.out.push_str("</svg>");

		self.out
	}

	fn paint(&mut self, node: &LayoutBox, parent_x: f32, parent_y: f32) {
		let x = parent_x + node.x;
		let y = parent_y + node.y;
		let radius = node.radius();

		let opacity = node.style.as_ref().map_or(1.0, |style| style.opacity);
		if opacity < 1.0 {
			write!(self.out, r#"<g opacity="{}">"#, num(opacity)).ok();
		}

		if let Some(background) = node
			.style
			.as_ref()
			.and_then(|style| style.background)
			.filter(Color::is_visible)
		{
			write!(
				self.out,
				r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
				num(x),
				num(y),
				num(node.width),
				num(node.height),
				corner_radius(radius),
				fill(background),
			).ok();
		}

		match &node.content {
			Content::Empty => {}
			Content::Image(href) => self.image(href, x, y, node.width, node.height, radius),
			Content::Text(block) => self.text(block, x, y),
		}

		for child in &node.children {
			self.paint(child, x, y);
		}

		if opacity < 1.0 {
			self.out.push_str("</g>");
		}
	}

	fn image(&mut self, href: &str, x: f32, y: f32, width: f32, height: f32, radius: f32) {
		let clip = if radius > 0.0 {
			self.clip_ids += 1;
			let id = format!("clip-{}", self.clip_ids);
			write!(
				self.out,
				r#"<clipPath id="{id}"><rect x="{}" y="{}" width="{}" height="{}"{}/></clipPath>"#,
				num(x),
				num(y),
				num(width),
				num(height),
				corner_radius(radius),
			).ok();
			format!(r#" clip-path="url(#{id})""#)
		} else {
			String::new()
		};

		write!(
			self.out,
			r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid slice" xlink:href="{}"{clip}/>"#,
			num(x),
			num(y),
			num(width),
			num(height),
			escape(href.trim()),
		).ok();
	}

	fn text(&mut self, block: &TextBlock, x: f32, y: f32) {
		for line in &block.lines {
			for segment in &line.segments {
				let style = &segment.style;
				write!(
					self.out,
					r#"<text x="{}" y="{}" font-family="'{}'" font-weight="{}" font-size="{}"{}>{}</text>"#,
					num(x + segment.x),
					num(y + line.baseline),
					escape(&style.family),
					style.weight,
					num(style.size),
					fill(style.color),
					escape(&segment.text),
				).ok();
			}
		}
	}
}

fn corner_radius(radius: f32) -> String {
	if radius > 0.0 {
		format!(r#" rx="{0}" ry="{0}""#, num(radius))
	} else {
		String::new()
	}
}

fn fill(color: Color) -> String {
	if color.a < 1.0 {
		format!(r#" fill="{}" fill-opacity="{}""#, color.hex(), num(color.a))
	} else {
		format!(r#" fill="{}""#, color.hex())
	}
}

/// Two decimals are plenty at pixel scale, and keep the output stable
fn num(value: f32) -> String {
	let formatted = format!("{value:.2}");
	let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');

	match trimmed {
		"" | "-0" => "0".to_owned(),
		other => other.to_owned(),
	}
}
