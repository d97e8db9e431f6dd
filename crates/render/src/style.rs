//! The slice of CSS the thumbnail templates need: compound selectors, a cascade in source order
//! and inheritance of the text properties. Everything is tokenized by `cssparser`.

use crate::markup::Element;

use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};
use taffy::style::{AlignItems, FlexDirection, JustifyContent};
use tracing::trace;

pub(crate) const DEFAULT_FONT_WEIGHT: u16 = 400;

/// What `rem` resolves against, documents can't change it
const ROOT_FONT_SIZE: f32 = 16.0;

type ParseResult<'i, T> = std::result::Result<T, ParseError<'i, ()>>;

/// Runs `parse` over the whole of `value`, anything left over fails it
fn parse_value<T>(
	value: &str,
	parse: impl for<'i, 't> FnOnce(&mut Parser<'i, 't>) -> ParseResult<'i, T>,
) -> Option<T> {
	let mut input = ParserInput::new(value);
	Parser::new(&mut input).parse_entirely(parse).ok()
}

/// One of a fixed set of identifiers, matched ASCII case-insensitively
fn keyword<'i, T: Copy>(
	input: &mut Parser<'i, '_>,
	keywords: &[(&str, T)],
) -> ParseResult<'i, T> {
	let location = input.current_source_location();
	let ident = input.expect_ident_cloned()?;

	keywords
		.iter()
		.find(|(name, _)| ident.eq_ignore_ascii_case(name))
		.map(|(_, value)| *value)
		.ok_or_else(|| location.new_unexpected_token_error(Token::Ident(ident)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f32,
}

const NAMED_COLORS: &[(&str, Color)] = &[
	("black", Color::BLACK),
	("white", Color::WHITE),
	("transparent", Color::TRANSPARENT),
	("red", Color::rgb(255, 0, 0)),
	("green", Color::rgb(0, 128, 0)),
	("blue", Color::rgb(0, 0, 255)),
	("gray", Color::rgb(128, 128, 128)),
	("grey", Color::rgb(128, 128, 128)),
	("silver", Color::rgb(192, 192, 192)),
	("orange", Color::rgb(255, 165, 0)),
	("yellow", Color::rgb(255, 255, 0)),
	("purple", Color::rgb(128, 0, 128)),
];

impl Color {
	pub const BLACK: Self = Self::rgb(0, 0, 0);
	pub const WHITE: Self = Self::rgb(255, 255, 255);
	pub const TRANSPARENT: Self = Self {
		r: 0,
		g: 0,
		b: 0,
		a: 0.0,
	};

	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub fn parse(value: &str) -> Option<Self> {
		parse_value(value, Self::from_tokens)
	}

	fn from_tokens<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Self> {
		let location = input.current_source_location();
		let token = input.next()?.clone();

		match token {
			Token::Hash(ref hex) | Token::IDHash(ref hex) => parse_hex(hex),
			Token::Ident(ref name) => NAMED_COLORS
				.iter()
				.find(|(named, _)| name.eq_ignore_ascii_case(named))
				.map(|(_, color)| *color),
			Token::Function(ref name)
				if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") =>
			{
				return input.parse_nested_block(rgb_arguments);
			}
			_ => None,
		}
		.ok_or_else(|| location.new_unexpected_token_error(token))
	}

	pub fn is_visible(&self) -> bool {
		self.a > 0.0
	}

	pub fn hex(&self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

/// Both the legacy comma separated form and the space separated one with a `/ alpha`
fn rgb_arguments<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Color> {
	let mut values = Vec::with_capacity(4);

	while !input.is_exhausted() {
		let location = input.current_source_location();
		match *input.next()? {
			Token::Number { value, .. } => values.push((value, false)),
			Token::Percentage { unit_value, .. } => values.push((unit_value, true)),
			Token::Comma | Token::Delim('/') => {}
			ref token => return Err(location.new_unexpected_token_error(token.clone())),
		}
	}

	let channel = |(value, percent): (f32, bool)| {
		clamp_channel(if percent { value * 255.0 } else { value })
	};

	let (r, g, b, (alpha, _)) = match values[..] {
		[r, g, b] => (r, g, b, (1.0, false)),
		[r, g, b, a] => (r, g, b, a),
		_ => return Err(input.new_custom_error(())),
	};

	Ok(Color {
		r: channel(r),
		g: channel(g),
		b: channel(b),
		a: alpha.clamp(0.0, 1.0),
	})
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn clamp_channel(value: f32) -> u8 {
	value.round().clamp(0.0, 255.0) as u8
}

fn parse_hex(hex: &str) -> Option<Color> {
	if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
		return None;
	}

	let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
	let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

	let (r, g, b, a) = match hex.len() {
		3 => (digit(0)?, digit(1)?, digit(2)?, 255),
		4 => (digit(0)?, digit(1)?, digit(2)?, digit(3)?),
		6 => (pair(0)?, pair(2)?, pair(4)?, 255),
		8 => (pair(0)?, pair(2)?, pair(4)?, pair(6)?),
		_ => return None,
	};

	Some(Color {
		r,
		g,
		b,
		a: f32::from(a) / 255.0,
	})
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Length {
	Px(f32),
	/// Fraction of the reference length, `50%` is `0.5`
	Percent(f32),
}

impl Length {
	pub fn parse(value: &str) -> Option<Self> {
		parse_value(value, Self::from_tokens)
	}

	fn from_tokens<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Self> {
		if let Ok(fraction) = input.try_parse(|input| input.expect_percentage()) {
			return Ok(Self::Percent(fraction));
		}

		px(input).map(Self::Px)
	}

	pub fn resolve(self, base: f32) -> f32 {
		match self {
			Self::Px(px) => px,
			Self::Percent(fraction) => base * fraction,
		}
	}
}

/// Pixels, unitless numbers and `rem`
fn px<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, f32> {
	let location = input.current_source_location();

	let px = match *input.next()? {
		Token::Number { value, .. } => value,
		Token::Dimension {
			value, ref unit, ..
		} if unit.eq_ignore_ascii_case("px") => value,
		Token::Dimension {
			value, ref unit, ..
		} if unit.eq_ignore_ascii_case("rem") => value * ROOT_FONT_SIZE,
		ref token => return Err(location.new_unexpected_token_error(token.clone())),
	};

	if px.is_finite() {
		Ok(px)
	} else {
		Err(location.new_custom_error(()))
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LineHeight {
	Normal,
	Multiplier(f32),
	Px(f32),
}

impl LineHeight {
	fn parse(value: &str) -> Option<Self> {
		parse_value(value, |input| {
			if input
				.try_parse(|input| input.expect_ident_matching("normal"))
				.is_ok()
			{
				return Ok(Self::Normal);
			}
			if let Ok(multiplier) = input.try_parse(|input| input.expect_number()) {
				return Ok(Self::Multiplier(multiplier));
			}
			if let Ok(fraction) = input.try_parse(|input| input.expect_percentage()) {
				return Ok(Self::Multiplier(fraction));
			}

			px(input).map(Self::Px)
		})
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Edges {
	pub top: f32,
	pub right: f32,
	pub bottom: f32,
	pub left: f32,
}

impl Edges {
	/// The usual one to four value shorthand
	fn parse(value: &str) -> Option<Self> {
		parse_value(value, |input| {
			let mut values = vec![px(input)?];
			while !input.is_exhausted() {
				values.push(px(input)?);
			}

			match values[..] {
				[all] => Ok(Self {
					top: all,
					right: all,
					bottom: all,
					left: all,
				}),
				[vertical, horizontal] => Ok(Self {
					top: vertical,
					right: horizontal,
					bottom: vertical,
					left: horizontal,
				}),
				[top, horizontal, bottom] => Ok(Self {
					top,
					right: horizontal,
					bottom,
					left: horizontal,
				}),
				[top, right, bottom, left] => Ok(Self {
					top,
					right,
					bottom,
					left,
				}),
				_ => Err(input.new_custom_error(())),
			}
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Display {
	Block,
	Inline,
	Flex,
	None,
}

const DISPLAY: &[(&str, Display)] = &[
	("flex", Display::Flex),
	("block", Display::Block),
	("inline", Display::Inline),
	("inline-block", Display::Inline),
	("none", Display::None),
];

const FLEX_DIRECTION: &[(&str, FlexDirection)] = &[
	("row", FlexDirection::Row),
	("row-reverse", FlexDirection::RowReverse),
	("column", FlexDirection::Column),
	("column-reverse", FlexDirection::ColumnReverse),
];

const ALIGN_ITEMS: &[(&str, AlignItems)] = &[
	("stretch", AlignItems::Stretch),
	("flex-start", AlignItems::FlexStart),
	("start", AlignItems::Start),
	("center", AlignItems::Center),
	("flex-end", AlignItems::FlexEnd),
	("end", AlignItems::End),
	("baseline", AlignItems::Baseline),
];

const JUSTIFY_CONTENT: &[(&str, JustifyContent)] = &[
	("flex-start", JustifyContent::FlexStart),
	("start", JustifyContent::Start),
	("center", JustifyContent::Center),
	("flex-end", JustifyContent::FlexEnd),
	("end", JustifyContent::End),
	("space-between", JustifyContent::SpaceBetween),
	("space-around", JustifyContent::SpaceAround),
	("space-evenly", JustifyContent::SpaceEvenly),
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ComputedStyle {
	// Inherited
	pub font_family: String,
	pub font_weight: u16,
	pub font_size: f32,
	pub line_height: LineHeight,
	pub color: Color,

	pub display: Display,
	pub background: Option<Color>,
	pub padding: Edges,
	pub margin: Edges,
	pub width: Option<Length>,
	pub height: Option<Length>,
	pub flex_direction: FlexDirection,
	pub flex_grow: f32,
	pub flex_shrink: f32,
	pub gap: Length,
	/// `None` is `normal`, which stretches
	pub align_items: Option<AlignItems>,
	pub justify_content: Option<JustifyContent>,
	pub border_radius: Option<Length>,
	pub line_clamp: Option<usize>,
	pub opacity: f32,

	/// Whether a rule or inline style on this very element set the font family or weight
	pub declares_font: bool,
}

impl ComputedStyle {
	pub fn root(font_family: impl Into<String>, font_size: f32) -> Self {
		Self {
			font_family: font_family.into(),
			font_weight: DEFAULT_FONT_WEIGHT,
			font_size,
			line_height: LineHeight::Normal,
			color: Color::BLACK,
			display: Display::Block,
			background: None,
			padding: Edges::default(),
			margin: Edges::default(),
			width: None,
			height: None,
			flex_direction: FlexDirection::Row,
			flex_grow: 0.0,
			flex_shrink: 1.0,
			gap: Length::Px(0.0),
			align_items: None,
			justify_content: None,
			border_radius: None,
			line_clamp: None,
			opacity: 1.0,
			declares_font: false,
		}
	}

	/// Starting point for a child element: text properties carried over, the rest reset
	fn inherit(&self, tag: &str) -> Self {
		let mut style = Self::root(self.font_family.clone(), self.font_size);
		style.font_weight = self.font_weight;
		style.line_height = self.line_height;
		style.color = self.color;
		style.display = match tag {
			"span" | "b" | "strong" | "em" | "i" | "a" => Display::Inline,
			_ => Display::Block,
		};
		style
	}

	/// Resolved line height in pixels, `normal` needs the font's own metrics
	pub fn line_height_px(&self, normal: impl FnOnce() -> f32) -> f32 {
		match self.line_height {
			LineHeight::Normal => normal(),
			LineHeight::Multiplier(multiplier) => self.font_size * multiplier,
			LineHeight::Px(px) => px,
		}
	}

	fn apply(&mut self, Declaration { name, value }: &Declaration) {
		let length = || parse_value(value, px);

		let applied = match name.as_str() {
			"font-family" => parse_value(value, font_family).map(|family| {
				self.font_family = family;
				self.declares_font = true;
			}),
			"font-weight" => parse_value(value, font_weight).map(|weight| {
				self.font_weight = weight;
				self.declares_font = true;
			}),
			"font-size" => length().map(|size| self.font_size = size),
			"line-height" => LineHeight::parse(value).map(|lh| self.line_height = lh),
			"color" => Color::parse(value).map(|color| self.color = color),
			"background-color" | "background" => {
				Color::parse(value).map(|color| self.background = Some(color))
			}
			"padding" => Edges::parse(value).map(|padding| self.padding = padding),
			"padding-top" => length().map(|top| self.padding.top = top),
			"padding-right" => length().map(|right| self.padding.right = right),
			"padding-bottom" => length().map(|bottom| self.padding.bottom = bottom),
			"padding-left" => length().map(|left| self.padding.left = left),
			"margin" => Edges::parse(value).map(|margin| self.margin = margin),
			"margin-top" => length().map(|top| self.margin.top = top),
			"margin-right" => length().map(|right| self.margin.right = right),
			"margin-bottom" => length().map(|bottom| self.margin.bottom = bottom),
			"margin-left" => length().map(|left| self.margin.left = left),
			"width" => Length::parse(value).map(|width| self.width = Some(width)),
			"height" => Length::parse(value).map(|height| self.height = Some(height)),
			"display" => parse_value(value, |input| keyword(input, DISPLAY))
				.map(|display| self.display = display),
			"flex-direction" => parse_value(value, |input| keyword(input, FLEX_DIRECTION))
				.map(|direction| self.flex_direction = direction),
			"flex-grow" => parse_value(value, non_negative).map(|grow| self.flex_grow = grow),
			"flex-shrink" => {
				parse_value(value, non_negative).map(|shrink| self.flex_shrink = shrink)
			}
			"gap" => Length::parse(value).map(|gap| self.gap = gap),
			"align-items" => parse_value(value, |input| keyword(input, ALIGN_ITEMS))
				.map(|align| self.align_items = Some(align)),
			"justify-content" => parse_value(value, |input| keyword(input, JUSTIFY_CONTENT))
				.map(|justify| self.justify_content = Some(justify)),
			"border-radius" => {
				Length::parse(value).map(|radius| self.border_radius = Some(radius))
			}
			"-webkit-line-clamp" | "line-clamp" => {
				parse_value(value, line_clamp).map(|clamp| self.line_clamp = clamp)
			}
			"opacity" => parse_value(value, |input| {
				input
					.try_parse(|input| input.expect_percentage())
					.or_else(|_| input.expect_number())
					.map_err(Into::into)
			})
			.map(|opacity| self.opacity = opacity.clamp(0.0, 1.0)),
			_ => None,
		};

		if applied.is_none() {
			trace!(%name, %value, "Ignoring unsupported declaration");
		}
	}
}

/// The first family of the list, the fallbacks are never consulted
fn font_family<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, String> {
	let family = input.parse_until_before(
		Delimiter::Comma,
		|input| -> ParseResult<'i, String> {
			if let Ok(quoted) = input.try_parse(|input| input.expect_string_cloned()) {
				return Ok(quoted.trim().to_owned());
			}

			// Unquoted names are a sequence of identifiers
			let mut words = vec![input.expect_ident()?.to_string()];
			while let Ok(word) = input.try_parse(|input| input.expect_ident_cloned()) {
				words.push(word.to_string());
			}
			Ok(words.join(" "))
		},
	)?;

	while input.next().is_ok() {}

	if family.is_empty() {
		Err(input.new_custom_error(()))
	} else {
		Ok(family)
	}
}

fn font_weight<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, u16> {
	const FONT_WEIGHT: &[(&str, u16)] = &[("normal", 400), ("bold", 700)];

	if let Ok(weight) = input.try_parse(|input| keyword(input, FONT_WEIGHT)) {
		return Ok(weight);
	}

	let location = input.current_source_location();
	let weight = input.expect_integer()?;

	u16::try_from(weight)
		.ok()
		.filter(|weight| (1..=1000).contains(weight))
		.ok_or_else(|| location.new_custom_error(()))
}

fn line_clamp<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Option<usize>> {
	if input
		.try_parse(|input| input.expect_ident_matching("none"))
		.is_ok()
	{
		return Ok(None);
	}

	let location = input.current_source_location();
	let lines = input.expect_integer()?;

	usize::try_from(lines)
		.ok()
		.filter(|lines| *lines > 0)
		.map(Some)
		.ok_or_else(|| location.new_custom_error(()))
}

fn non_negative<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, f32> {
	let location = input.current_source_location();
	let value = input.expect_number()?;

	if value >= 0.0 {
		Ok(value)
	} else {
		Err(location.new_custom_error(()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Declaration {
	pub name: String,
	/// Source text of the value, without `!important`
	pub value: String,
}

/// Declarations of an inline `style` attribute
pub(crate) fn parse_declarations(block: &str) -> Vec<Declaration> {
	let mut input = ParserInput::new(block);
	declaration_list(&mut Parser::new(&mut input))
}

/// A malformed declaration is skipped up to the next `;`, the ones after it still apply
fn declaration_list(input: &mut Parser<'_, '_>) -> Vec<Declaration> {
	let mut declarations = vec![];

	while !input.is_exhausted() {
		match input.parse_until_after(Delimiter::Semicolon, declaration) {
			Ok(declaration) => declarations.push(declaration),
			Err(e) => trace!(?e, "Skipping malformed declaration"),
		}
	}

	declarations
}

fn declaration<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Declaration> {
	let name = input.expect_ident()?.to_ascii_lowercase();
	input.expect_colon()?;

	let start = input.position();
	let mut end = start;
	loop {
		let before = input.position();
		match input.next().map(|token| matches!(token, Token::Delim('!'))) {
			Err(_) => break,
			Ok(true) => {
				end = before;
				// `!important` changes nothing here, the cascade is source order only
				while input.next().is_ok() {}
				break;
			}
			Ok(false) => end = input.position(),
		}
	}

	let value = input.slice(start..end).trim();
	if value.is_empty() {
		return Err(input.new_custom_error(()));
	}

	Ok(Declaration {
		name,
		value: value.to_owned(),
	})
}

/// A compound selector like `div`, `.card`, `#title` or `p.card.svelte-1x2y`.
///
/// Combinators and pseudo classes are not supported, selectors using them are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Selector {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
}

impl Selector {
	fn parse<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Self> {
		let mut selector = Self::default();
		let mut first = true;

		input.skip_whitespace();
		loop {
			let location = input.current_source_location();
			let Ok(token) = input.next_including_whitespace().cloned() else {
				break;
			};

			match token {
				Token::Ident(tag) if first => selector.tag = Some(tag.to_ascii_lowercase()),
				Token::Delim('*') if first => {}
				Token::IDHash(id) => selector.id = Some(id.to_string()),
				Token::Delim('.') => match *input.next_including_whitespace()? {
					Token::Ident(ref class) => selector.classes.push(class.to_string()),
					ref token => return Err(location.new_unexpected_token_error(token.clone())),
				},
				Token::WhiteSpace(_) if input.is_exhausted() => break,
				token => return Err(location.new_unexpected_token_error(token)),
			}
			first = false;
		}

		if first {
			Err(input.new_custom_error(()))
		} else {
			Ok(selector)
		}
	}

	fn matches(&self, element: &Element) -> bool {
		self.tag.as_ref().map_or(true, |tag| *tag == element.tag)
			&& self
				.id
				.as_ref()
				.map_or(true, |id| element.id.as_ref() == Some(id))
			&& self
				.classes
				.iter()
				.all(|class| element.classes.contains(class))
	}
}

/// Unsupported selectors are dropped from the list, it fails only when none are left
fn selector_list<'i>(input: &mut Parser<'i, '_>) -> ParseResult<'i, Vec<Selector>> {
	let mut selectors = vec![];

	while !input.is_exhausted() {
		match input.parse_until_after(Delimiter::Comma, Selector::parse) {
			Ok(selector) => selectors.push(selector),
			Err(e) => trace!(?e, "Skipping unsupported selector"),
		}
	}

	if selectors.is_empty() {
		Err(input.new_custom_error(()))
	} else {
		Ok(selectors)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
	selectors: Vec<Selector>,
	declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Stylesheet {
	rules: Vec<Rule>,
}

impl Stylesheet {
	pub fn parse(css: &str) -> Self {
		let mut sheet = Self::default();
		sheet.extend(css);
		sheet
	}

	/// Appends the rules of another stylesheet, they win over every rule already present.
	///
	/// At-rules are skipped whole, `@media` blocks included.
	pub fn extend(&mut self, css: &str) {
		let mut input = ParserInput::new(css);
		let mut input = Parser::new(&mut input);

		while !input.is_exhausted() {
			let prelude = input.parse_until_before(
				Delimiter::CurlyBracketBlock | Delimiter::Semicolon,
				selector_list,
			);
			let has_block = matches!(input.next(), Ok(Token::CurlyBracketBlock));

			match prelude {
				Ok(selectors) if has_block => {
					let declarations = input
						.parse_nested_block(|block| {
							Ok::<_, ParseError<'_, ()>>(declaration_list(block))
						})
						.unwrap_or_default();

					self.rules.push(Rule {
						selectors,
						declarations,
					});
				}
				Ok(_) => trace!("Skipping rule without a block"),
				Err(e) => trace!(?e, "Skipping at-rule or rule without supported selectors"),
			}
		}
	}

	/// Cascades every matching rule in source order, then the inline style
	pub fn compute(&self, element: &Element, parent: &ComputedStyle) -> ComputedStyle {
		let mut style = parent.inherit(&element.tag);

		self.rules
			.iter()
			.filter(|rule| rule.selectors.iter().any(|s| s.matches(element)))
			.flat_map(|rule| &rule.declarations)
			.for_each(|declaration| style.apply(declaration));

		if let Some(inline) = &element.style {
			parse_declarations(inline)
				.iter()
				.for_each(|declaration| style.apply(declaration));
		}

		style
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn element(tag: &str, classes: &[&str]) -> Element {
		Element {
			tag: tag.to_owned(),
			classes: classes.iter().map(ToString::to_string).collect(),
			..Default::default()
		}
	}

	fn root() -> ComputedStyle {
		ComputedStyle::root("Inter", 16.0)
	}

	#[test]
	fn parses_colors() {
		assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
		assert_eq!(Color::parse("#1F2937"), Some(Color::rgb(0x1f, 0x29, 0x37)));
		assert_eq!(Color::parse("rgb(10, 20, 30)"), Some(Color::rgb(10, 20, 30)));
		assert_eq!(Color::parse("rgba(0,0,0,0.5)").map(|c| c.a), Some(0.5));
		assert_eq!(Color::parse("rgb(0 0 0 / 25%)").map(|c| c.a), Some(0.25));
		assert_eq!(Color::parse("#00000080").map(|c| c.a), Some(128.0 / 255.0));
		assert_eq!(Color::parse("transparent"), Some(Color::TRANSPARENT));
		assert_eq!(Color::parse("Red"), Some(Color::rgb(255, 0, 0)));
		assert_eq!(Color::parse("#12"), None);
		assert_eq!(Color::parse("chartreuse-ish"), None);
		assert_eq!(Color::parse("rgb(1, 2)"), None);
		assert_eq!(Color::parse("#fff #000"), None);
		assert_eq!(Color::rgb(17, 24, 39).hex(), "#111827");
	}

	#[test]
	fn parses_lengths() {
		assert_eq!(Length::parse("12px"), Some(Length::Px(12.0)));
		assert_eq!(Length::parse("0"), Some(Length::Px(0.0)));
		assert_eq!(Length::parse("2rem"), Some(Length::Px(32.0)));
		assert_eq!(Length::parse("50%").map(|l| l.resolve(300.0)), Some(150.0));
		assert_eq!(Length::parse("auto"), None);
		assert_eq!(Length::parse("3em"), None);
		assert_eq!(
			Edges::parse("8px 16px"),
			Some(Edges {
				top: 8.0,
				right: 16.0,
				bottom: 8.0,
				left: 16.0
			})
		);
		assert_eq!(Edges::parse("1px 2px 3px 4px 5px"), None);
		assert_eq!(LineHeight::parse("150%"), Some(LineHeight::Multiplier(1.5)));
		assert_eq!(LineHeight::parse("20px"), Some(LineHeight::Px(20.0)));
	}

	#[test]
	fn compound_selectors() {
		let sheet = Stylesheet::parse(
			"p.title.svelte-x1 { font-size: 40px } .title p { font-size: 1px } a:hover { color: red }",
		);

		let style = sheet.compute(&element("p", &["title", "svelte-x1"]), &root());
		assert!((style.font_size - 40.0).abs() < f32::EPSILON);

		// Combinators and pseudo classes drop the rule
		assert_eq!(sheet.rules.len(), 1);

		let style = sheet.compute(&element("div", &["title", "svelte-x1"]), &root());
		assert!((style.font_size - 16.0).abs() < f32::EPSILON);
	}

	#[test]
	fn unsupported_selectors_leave_the_rest_of_the_list() {
		let sheet = Stylesheet::parse("a:hover, #title, * { color: #222 }");

		assert_eq!(sheet.rules.len(), 1);
		assert_eq!(sheet.rules[0].selectors.len(), 2);

		let mut title = element("h1", &[]);
		title.id = Some("title".to_owned());
		assert_eq!(sheet.compute(&title, &root()).color, Color::rgb(0x22, 0x22, 0x22));
	}

	#[test]
	fn later_rules_and_inline_styles_win() {
		let sheet = Stylesheet::parse(
			"/* base */ .a { color: #000; font-weight: 500 } div { color: #111 } .a, .b { color: #222 }",
		);

		let mut div = element("div", &["a"]);
		assert_eq!(sheet.compute(&div, &root()).color, Color::rgb(0x22, 0x22, 0x22));

		div.style = Some("color: #333; font-weight: bold !important".to_owned());
		let style = sheet.compute(&div, &root());
		assert_eq!(style.color, Color::rgb(0x33, 0x33, 0x33));
		assert_eq!(style.font_weight, 700);
		assert!(style.declares_font);
	}

	#[test]
	fn semicolons_inside_strings_stay_in_the_value() {
		let declarations =
			parse_declarations("font-family: \"A;B\", serif; color: red; broken; gap: 4px");

		assert_eq!(
			declarations,
			vec![
				Declaration {
					name: "font-family".to_owned(),
					value: "\"A;B\", serif".to_owned(),
				},
				Declaration {
					name: "color".to_owned(),
					value: "red".to_owned(),
				},
				Declaration {
					name: "gap".to_owned(),
					value: "4px".to_owned(),
				},
			]
		);

		let mut div = element("div", &[]);
		div.style = Some("font-family: \"A;B\", serif; color: red".to_owned());
		let style = Stylesheet::default().compute(&div, &root());
		assert_eq!(style.font_family, "A;B");
		assert_eq!(style.color, Color::rgb(255, 0, 0));
	}

	#[test]
	fn inherits_text_properties_only() {
		let sheet = Stylesheet::parse(
			".parent { font-family: 'DejaVu Sans', sans-serif; font-weight: 700; color: red; \
			 background-color: blue; padding: 10px; line-height: 1.5 }",
		);

		let parent = sheet.compute(&element("div", &["parent"]), &root());
		let child = sheet.compute(&element("span", &[]), &parent);

		assert_eq!(parent.font_family, "DejaVu Sans");
		assert_eq!(child.font_family, "DejaVu Sans");
		assert_eq!(child.font_weight, 700);
		assert_eq!(child.color, Color::rgb(255, 0, 0));
		assert_eq!(child.line_height, LineHeight::Multiplier(1.5));
		assert_eq!(child.background, None);
		assert_eq!(child.padding, Edges::default());
		assert_eq!(child.display, Display::Inline);
		assert!(!child.declares_font);
	}

	#[test]
	fn unquoted_families_keep_their_spaces() {
		let sheet = Stylesheet::parse(".a { font-family: DejaVu  Sans, sans-serif }");

		assert_eq!(
			sheet.compute(&element("p", &["a"]), &root()).font_family,
			"DejaVu Sans"
		);
	}

	#[test]
	fn skips_at_rules() {
		let sheet = Stylesheet::parse(
			"@import url(foo.css); @media (max-width: 10px) { .a { color: red } } .b { gap: 4px }",
		);

		assert_eq!(sheet.rules.len(), 1);
		assert_eq!(
			sheet.compute(&element("div", &["b"]), &root()).gap,
			Length::Px(4.0)
		);
		assert_eq!(
			sheet.compute(&element("div", &["a"]), &root()).color,
			Color::BLACK
		);
	}

	#[test]
	fn flex_keywords() {
		let sheet = Stylesheet::parse(
			".a { display: flex; flex-direction: column; align-items: center; \
			 justify-content: space-between; flex-shrink: 0 } .b { align-items: sideways; flex-shrink: -1 }",
		);

		let style = sheet.compute(&element("div", &["a", "b"]), &root());
		assert_eq!(style.display, Display::Flex);
		assert_eq!(style.flex_direction, FlexDirection::Column);
		assert_eq!(style.align_items, Some(AlignItems::Center));
		assert_eq!(style.justify_content, Some(JustifyContent::SpaceBetween));
		assert!(style.flex_shrink.abs() < f32::EPSILON);
	}

	#[test]
	fn line_clamp() {
		let sheet = Stylesheet::parse(".a { -webkit-line-clamp: 3 } .b { line-clamp: none }");

		assert_eq!(sheet.compute(&element("p", &["a"]), &root()).line_clamp, Some(3));
		assert_eq!(sheet.compute(&element("p", &["a", "b"]), &root()).line_clamp, None);
	}
}
