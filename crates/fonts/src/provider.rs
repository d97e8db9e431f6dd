use std::collections::BTreeSet;

use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token, UnicodeRange};
use tracing::trace;

pub const DEFAULT_STYLESHEET_BASE: &str = "https://fonts.googleapis.com";

/// Where stylesheets advertising font binaries come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontProvider {
	pub stylesheet_base: String,
}

impl Default for FontProvider {
	fn default() -> Self {
		Self {
			stylesheet_base: DEFAULT_STYLESHEET_BASE.to_string(),
		}
	}
}

impl FontProvider {
	pub fn new(stylesheet_base: impl Into<String>) -> Self {
		Self {
			stylesheet_base: stylesheet_base.into(),
		}
	}

	/// Stylesheet for a family with the requested weights, the provider wants them ascending
	/// and `;` separated
	pub fn stylesheet_url(&self, family: &str, weights: impl IntoIterator<Item = u16>) -> String {
		let weights = weights
			.into_iter()
			.collect::<BTreeSet<_>>()
			.into_iter()
			.map(|weight| weight.to_string())
			.collect::<Vec<_>>()
			.join(";");

		format!(
			"{}/css2?family={}:wght@{weights}&display=swap",
			self.stylesheet_base.trim_end_matches('/'),
			family.trim().replace(' ', "+"),
		)
	}
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FontFace {
	weight: Option<u16>,
	style: Option<String>,
	unicode_range: Option<Vec<(u32, u32)>>,
	url: Option<String>,
}

impl FontFace {
	fn is_normal_style(&self) -> bool {
		self.style.as_deref().map_or(true, |style| style == "normal")
	}

	/// A face without `unicode-range` is the whole font, otherwise it must at least carry `A`
	fn covers_basic_latin(&self) -> bool {
		const LATIN_CAPITAL_A: u32 = 0x41;

		self.unicode_range.as_ref().map_or(true, |ranges| {
			ranges
				.iter()
				.any(|(start, end)| (*start..=*end).contains(&LATIN_CAPITAL_A))
		})
	}
}

/// Picks the binary URL for exactly `weight` out of a provider stylesheet.
///
/// Stylesheets may list the same weight more than once (italics, unicode subsets), so among the
/// blocks declaring exactly this weight we prefer a normal style, then a block covering basic
/// latin, then whatever came first. Weight ranges like `100 900` never match.
#[must_use]
pub fn select_font_url(css: &str, weight: u16) -> Option<String> {
	parse_font_faces(css)
		.into_iter()
		.enumerate()
		.filter(|(_, face)| face.weight == Some(weight) && face.url.is_some())
		.min_by_key(|(index, face)| {
			(
				!face.is_normal_style(),
				!face.covers_basic_latin(),
				*index,
			)
		})
		.and_then(|(_, face)| face.url)
}

type ParseResult<'i, T> = std::result::Result<T, ParseError<'i, ()>>;

/// Every `@font-face` block of the stylesheet, other rules are skipped whole
fn parse_font_faces(css: &str) -> Vec<FontFace> {
	let mut input = ParserInput::new(css);
	let mut input = Parser::new(&mut input);
	let mut faces = vec![];

	while !input.is_exhausted() {
		let font_face = input
			.parse_until_before(
				Delimiter::CurlyBracketBlock | Delimiter::Semicolon,
				is_font_face,
			)
			.unwrap_or(false);

		if !matches!(input.next(), Ok(Token::CurlyBracketBlock)) || !font_face {
			continue;
		}

		faces.push(
			input
				.parse_nested_block(|block| Ok::<_, ParseError<'_, ()>>(descriptors(block)))
				.unwrap_or_default(),
		);
	}

	faces
}

fn is_font_face<'i>(prelude: &mut Parser<'i, '_>) -> ParseResult<'i, bool> {
	let font_face = matches!(
		prelude.next(),
		Ok(Token::AtKeyword(name)) if name.eq_ignore_ascii_case("font-face")
	);
	while prelude.next().is_ok() {}

	Ok(font_face)
}

enum Descriptor {
	Weight(u16),
	Style(String),
	UnicodeRange(Vec<(u32, u32)>),
	Src(Option<String>),
	Other,
}

/// A descriptor that fails to parse leaves the face as if it wasn't there
fn descriptors(block: &mut Parser<'_, '_>) -> FontFace {
	let mut face = FontFace::default();

	while !block.is_exhausted() {
		match block.parse_until_after(Delimiter::Semicolon, descriptor) {
			Ok(Descriptor::Weight(weight)) => face.weight = Some(weight),
			Ok(Descriptor::Style(style)) => face.style = Some(style),
			Ok(Descriptor::UnicodeRange(ranges)) => face.unicode_range = Some(ranges),
			Ok(Descriptor::Src(url)) => face.url = url,
			Ok(Descriptor::Other) => {}
			Err(e) => trace!(?e, "Skipping font-face descriptor"),
		}
	}

	face
}

fn descriptor<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Descriptor> {
	let name = input.expect_ident_cloned()?;
	input.expect_colon()?;

	let descriptor = match name.to_ascii_lowercase().as_str() {
		// Variable font ranges (`100 900`) leave a second number behind and fail here
		"font-weight" => Descriptor::Weight(font_weight(input)?),
		"font-style" => {
			let style = input.expect_ident()?.to_ascii_lowercase();
			// `oblique 10deg`
			while input.next().is_ok() {}
			Descriptor::Style(style)
		}
		"unicode-range" => Descriptor::UnicodeRange(input.parse_comma_separated(
			|input| -> ParseResult<'i, (u32, u32)> {
				let range = UnicodeRange::parse(input)?;
				Ok((range.start, range.end))
			},
		)?),
		"src" => Descriptor::Src(first_url(input)?),
		_ => {
			while input.next().is_ok() {}
			Descriptor::Other
		}
	};

	Ok(descriptor)
}

fn font_weight<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, u16> {
	let location = input.current_source_location();

	match *input.next()? {
		Token::Ident(ref name) if name.eq_ignore_ascii_case("normal") => Ok(400),
		Token::Ident(ref name) if name.eq_ignore_ascii_case("bold") => Ok(700),
		Token::Number {
			int_value: Some(weight),
			..
		} => u16::try_from(weight).map_err(|_| location.new_custom_error(())),
		ref token => Err(location.new_unexpected_token_error(token.clone())),
	}
}

/// The first `url()` of a `src` list, `local()` sources are passed over
fn first_url<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Option<String>> {
	let urls = input.parse_comma_separated(|source| -> ParseResult<'i, Option<String>> {
		let url = source
			.try_parse(|source| source.expect_url())
			.ok()
			.map(|url| url.trim().to_owned())
			.filter(|url| !url.is_empty());
		// `format('woff2')` and the like
		while source.next().is_ok() {}

		Ok(url)
	})?;

	Ok(urls.into_iter().flatten().next())
}
