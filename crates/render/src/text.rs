use crate::{
	style::{Color, ComputedStyle},
	FontSet, RenderError, Result,
};

use std::collections::HashMap;

use ttf_parser::{Face, GlyphId};

const ELLIPSIS: &str = "\u{2026}";
const ELLIPSIS_FALLBACK: &str = "...";

/// Advance used when a face is missing altogether, as a fraction of the font size
const FALLBACK_ADVANCE: f32 = 0.55;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextStyle {
	pub family: String,
	pub weight: u16,
	pub size: f32,
	pub line_height: f32,
	pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Run {
	pub text: String,
	pub style: TextStyle,
}

/// Consecutive words sharing a style, `x` relative to the start of the line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Segment {
	pub x: f32,
	pub text: String,
	pub style: TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Line {
	/// Relative to the top of the text block
	pub baseline: f32,
	pub width: f32,
	pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TextBlock {
	pub lines: Vec<Line>,
	pub width: f32,
	pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VerticalMetrics {
	pub ascender: f32,
	pub descender: f32,
	pub line_gap: f32,
}

/// Per-glyph advance measurement over the supplied fonts, no shaping and no kerning.
pub(crate) struct TextMeasurer<'f> {
	faces: HashMap<&'f str, HashMap<u16, Face<'f>>>,
}

impl<'f> TextMeasurer<'f> {
	pub fn new(fonts: &'f FontSet) -> Result<Self> {
		let mut faces = HashMap::<&str, HashMap<u16, Face<'_>>>::new();

		for (family, weight, data) in fonts.iter() {
			let face = Face::parse(&data[..], 0).map_err(|_| RenderError::InvalidFont {
				family: family.to_owned(),
				weight,
			})?;
			faces.entry(family).or_default().insert(weight, face);
		}

		Ok(Self { faces })
	}

	fn face(&self, family: &str, weight: u16) -> Option<&Face<'f>> {
		self.faces.get(family).and_then(|weights| weights.get(&weight))
	}

	pub fn advance(&self, style: &TextStyle, c: char) -> f32 {
		self.face(&style.family, style.weight)
			.map_or(style.size * FALLBACK_ADVANCE, |face| {
				let units = face
					.glyph_index(c)
					.and_then(|glyph| face.glyph_hor_advance(glyph))
					// Whatever `.notdef` looks like, it will be drawn that wide
					.or_else(|| face.glyph_hor_advance(GlyphId(0)))
					.unwrap_or_default();

				f32::from(units) * style.size / f32::from(face.units_per_em())
			})
	}

	pub fn width(&self, style: &TextStyle, text: &str) -> f32 {
		text.chars().map(|c| self.advance(style, c)).sum()
	}

	pub fn has_glyph(&self, style: &TextStyle, c: char) -> bool {
		self.face(&style.family, style.weight)
			.is_some_and(|face| face.glyph_index(c).is_some())
	}

	pub fn vertical_metrics(&self, family: &str, weight: u16, size: f32) -> VerticalMetrics {
		self.face(family, weight).map_or(
			VerticalMetrics {
				ascender: size * 0.8,
				descender: size * -0.2,
				line_gap: 0.0,
			},
			|face| {
				let scale = size / f32::from(face.units_per_em());
				VerticalMetrics {
					ascender: f32::from(face.ascender()) * scale,
					descender: f32::from(face.descender()) * scale,
					line_gap: f32::from(face.line_gap()) * scale,
				}
			},
		)
	}

	pub fn text_style(&self, style: &ComputedStyle) -> TextStyle {
		let metrics = self.vertical_metrics(&style.font_family, style.font_weight, style.font_size);

		TextStyle {
			family: style.font_family.clone(),
			weight: style.font_weight,
			size: style.font_size,
			line_height: style.line_height_px(|| {
				metrics.ascender - metrics.descender + metrics.line_gap
			}),
			color: style.color,
		}
	}
}

#[derive(Debug, Clone)]
struct Word<'r> {
	text: String,
	style: &'r TextStyle,
	space_before: bool,
	width: f32,
}

/// Collapses whitespace the CSS `normal` way, a space survives between words even across runs
fn collect_words<'r>(measurer: &TextMeasurer<'_>, runs: &'r [Run]) -> Vec<Word<'r>> {
	let mut words = Vec::<Word<'_>>::new();
	let mut pending_space = false;

	for run in runs {
		if run.text.starts_with(char::is_whitespace) {
			pending_space = true;
		}

		for (i, piece) in run.text.split_whitespace().enumerate() {
			if i > 0 {
				pending_space = true;
			}

			words.push(Word {
				text: piece.to_owned(),
				style: &run.style,
				space_before: pending_space && !words.is_empty(),
				width: measurer.width(&run.style, piece),
			});
			pending_space = false;
		}

		if run.text.ends_with(char::is_whitespace) {
			pending_space = true;
		}
	}

	words
}

fn space_before(measurer: &TextMeasurer<'_>, word: &Word<'_>, first_on_line: bool) -> f32 {
	if word.space_before && !first_on_line {
		measurer.width(word.style, " ")
	} else {
		0.0
	}
}

fn line_width(measurer: &TextMeasurer<'_>, words: &[Word<'_>]) -> f32 {
	words
		.iter()
		.enumerate()
		.map(|(i, word)| space_before(measurer, word, i == 0) + word.width)
		.sum()
}

/// Width of the runs laid out on a single line
pub(crate) fn max_content_width(measurer: &TextMeasurer<'_>, runs: &[Run]) -> f32 {
	line_width(measurer, &collect_words(measurer, runs))
}

/// Width of the widest word, lines never get narrower than that without splitting words
pub(crate) fn min_content_width(measurer: &TextMeasurer<'_>, runs: &[Run]) -> f32 {
	collect_words(measurer, runs)
		.iter()
		.map(|word| word.width)
		.fold(0.0, f32::max)
}

/// Greedy line breaking at word boundaries, with an ellipsis on the last line when `clamp`
/// cuts lines off.
pub(crate) fn layout_text(
	measurer: &TextMeasurer<'_>,
	runs: &[Run],
	max_width: f32,
	clamp: Option<usize>,
) -> TextBlock {
	let mut lines = Vec::<Vec<Word<'_>>>::new();
	let mut current = Vec::<Word<'_>>::new();
	let mut current_width = 0.0;

	for mut word in collect_words(measurer, runs) {
		let space = space_before(measurer, &word, current.is_empty());

		if !current.is_empty() && current_width + space + word.width > max_width {
			lines.push(std::mem::take(&mut current));
		}

		if current.is_empty() {
			word.space_before = false;

			// Words wider than the whole line get split wherever they overflow
			while word.width > max_width && word.text.chars().nth(1).is_some() {
				let (head, tail) = split_to_fit(measurer, word, max_width);
				lines.push(vec![head]);
				word = tail;
			}

			current_width = word.width;
		} else {
			current_width += space + word.width;
		}

		current.push(word);
	}

	if !current.is_empty() {
		lines.push(current);
	}

	if let Some(clamp) = clamp {
		if lines.len() > clamp {
			lines.truncate(clamp);
			if let Some(last) = lines.last_mut() {
				ellipsize(measurer, last, max_width);
			}
		}
	}

	position_lines(measurer, &lines)
}

fn split_to_fit<'r>(
	measurer: &TextMeasurer<'_>,
	word: Word<'r>,
	max_width: f32,
) -> (Word<'r>, Word<'r>) {
	let mut width = 0.0;
	let mut split = 0;

	for (i, c) in word.text.char_indices() {
		let advance = measurer.advance(word.style, c);
		// At least one character per line, or we'd never make progress
		if i > 0 && width + advance > max_width {
			break;
		}
		width += advance;
		split = i + c.len_utf8();
	}

	let (head, tail) = word.text.split_at(split);

	(
		Word {
			text: head.to_owned(),
			style: word.style,
			space_before: false,
			width,
		},
		Word {
			text: tail.to_owned(),
			style: word.style,
			space_before: false,
			width: measurer.width(word.style, tail),
		},
	)
}

fn ellipsize<'r>(measurer: &TextMeasurer<'_>, line: &mut Vec<Word<'r>>, max_width: f32) {
	let Some(style) = line.last().map(|word| word.style) else {
		return;
	};

	let ellipsis = if ELLIPSIS.chars().all(|c| measurer.has_glyph(style, c)) {
		ELLIPSIS
	} else {
		ELLIPSIS_FALLBACK
	};
	let ellipsis_width = measurer.width(style, ellipsis);

	while line_width(measurer, line) + ellipsis_width > max_width {
		let Some(last) = line.last_mut() else {
			break;
		};

		if last.text.chars().nth(1).is_some() {
			last.text.pop();
			last.width = measurer.width(last.style, &last.text);
		} else {
			line.pop();
		}
	}

	match line.last_mut() {
		Some(last) => {
			last.text.push_str(ellipsis);
			last.width = measurer.width(last.style, &last.text);
		}
		None => line.push(Word {
			text: ellipsis.to_owned(),
			style,
			space_before: false,
			width: ellipsis_width,
		}),
	}
}

fn position_lines(measurer: &TextMeasurer<'_>, lines: &[Vec<Word<'_>>]) -> TextBlock {
	let mut block = TextBlock::default();

	for words in lines {
		let mut line = Line::default();
		let mut height = 0.0_f32;
		let mut ascender = 0.0_f32;
		let mut descender = 0.0_f32;

		for (i, word) in words.iter().enumerate() {
			let space = space_before(measurer, word, i == 0);

			match line.segments.last_mut() {
				Some(segment) if segment.style == *word.style => {
					if space > 0.0 {
						segment.text.push(' ');
					}
					segment.text.push_str(&word.text);
				}
				_ => line.segments.push(Segment {
					x: line.width + space,
					text: word.text.clone(),
					style: word.style.clone(),
				}),
			}
			line.width += space + word.width;

			let metrics =
				measurer.vertical_metrics(&word.style.family, word.style.weight, word.style.size);
			height = height.max(word.style.line_height);
			ascender = ascender.max(metrics.ascender);
			descender = descender.min(metrics.descender);
		}

		// Half leading above and below, like CSS does
		line.baseline = block.height + (height - (ascender - descender)) / 2.0 + ascender;

		block.height += height;
		block.width = block.width.max(line.width);
		block.lines.push(line);
	}

	block
}

#[cfg(test)]
pub(crate) mod tests {
	use super::*;

	use bytes::Bytes;

	pub(crate) const FAMILY: &str = "DejaVu Sans";

	pub(crate) fn fixture_fonts() -> FontSet {
		FontSet::new()
			.with(
				FAMILY,
				400,
				Bytes::from_static(include_bytes!("../tests/fixtures/DejaVuSans.ttf")),
			)
			.with(
				FAMILY,
				700,
				Bytes::from_static(include_bytes!("../tests/fixtures/DejaVuSans-Bold.ttf")),
			)
	}

	fn run(measurer: &TextMeasurer<'_>, text: &str, weight: u16) -> Run {
		let mut style = ComputedStyle::root(FAMILY, 20.0);
		style.font_weight = weight;

		Run {
			text: text.to_owned(),
			style: measurer.text_style(&style),
		}
	}

	fn texts(block: &TextBlock) -> Vec<String> {
		block
			.lines
			.iter()
			.map(|line| {
				line.segments
					.iter()
					.map(|segment| segment.text.as_str())
					.collect::<Vec<_>>()
					.join("|")
			})
			.collect()
	}

	#[test]
	fn measures_with_the_real_font() {
		let fonts = fixture_fonts();
		let measurer = TextMeasurer::new(&fonts).unwrap();
		let regular = run(&measurer, "", 400).style;
		let bold = run(&measurer, "", 700).style;

		let narrow = measurer.width(&regular, "iiii");
		let wide = measurer.width(&regular, "WWWW");
		assert!(narrow > 0.0 && wide > narrow * 2.0);
		assert!(measurer.width(&bold, "Hello") > measurer.width(&regular, "Hello"));
		assert!(measurer.has_glyph(&regular, '\u{2026}'));
	}

	#[test]
	fn rejects_garbage_fonts() {
		let fonts = FontSet::new().with("Broken", 400, Bytes::from_static(b"not a font"));

		assert!(matches!(
			TextMeasurer::new(&fonts),
			Err(RenderError::InvalidFont { weight: 400, .. })
		));
	}

	#[test]
	fn wraps_on_word_boundaries() {
		let fonts = fixture_fonts();
		let measurer = TextMeasurer::new(&fonts).unwrap();
		let runs = [run(&measurer, "  the quick   brown fox jumps over the lazy dog ", 400)];

		let single = layout_text(&measurer, &runs, f32::INFINITY, None);
		assert_eq!(texts(&single), vec!["the quick brown fox jumps over the lazy dog"]);

		let width = measurer.width(&runs[0].style, "the quick brown");
		let wrapped = layout_text(&measurer, &runs, width + 1.0, None);
		assert_eq!(
			texts(&wrapped),
			vec!["the quick brown", "fox jumps over", "the lazy dog"]
		);
		assert!(wrapped.lines.iter().all(|line| line.width <= width + 1.0));
		assert!((wrapped.height - runs[0].style.line_height * 3.0).abs() < 0.01);
		assert!(wrapped.lines[1].baseline > wrapped.lines[0].baseline);
	}

	#[test]
	fn keeps_runs_apart() {
		let fonts = fixture_fonts();
		let measurer = TextMeasurer::new(&fonts).unwrap();
		let runs = [
			run(&measurer, "Created by ", 400),
			run(&measurer, "someone", 700),
			run(&measurer, " else", 400),
		];

		let block = layout_text(&measurer, &runs, f32::INFINITY, None);

		assert_eq!(texts(&block), vec!["Created by|someone|else"]);
		let segments = &block.lines[0].segments;
		assert_eq!(segments[1].style.weight, 700);
		assert!(segments[1].x > measurer.width(&runs[0].style, "Created by"));
		assert!(
			(max_content_width(&measurer, &runs) - block.lines[0].width).abs() < f32::EPSILON
		);

		let widest = [(0, "Created"), (0, "by"), (1, "someone"), (2, "else")]
			.into_iter()
			.map(|(run, word)| measurer.width(&runs[run].style, word))
			.fold(0.0, f32::max);
		assert!((min_content_width(&measurer, &runs) - widest).abs() < f32::EPSILON);
	}

	#[test]
	fn splits_overlong_words() {
		let fonts = fixture_fonts();
		let measurer = TextMeasurer::new(&fonts).unwrap();
		let runs = [run(&measurer, "aaaaaaaaaaaaaaaaaaaa", 400)];
		let width = measurer.width(&runs[0].style, "aaaaaaa");

		let block = layout_text(&measurer, &runs, width, None);

		assert_eq!(texts(&block), vec!["aaaaaaa", "aaaaaaa", "aaaaaa"]);
	}

	#[test]
	fn clamps_with_an_ellipsis() {
		let fonts = fixture_fonts();
		let measurer = TextMeasurer::new(&fonts).unwrap();
		let runs = [run(&measurer, "one two three four five six seven eight", 400)];
		let width = measurer.width(&runs[0].style, "one two three") + 1.0;

		let block = layout_text(&measurer, &runs, width, Some(2));

		let lines = texts(&block);
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[0], "one two three");
		assert!(lines[1].ends_with('\u{2026}'), "{lines:?}");
		assert!(block.lines[1].width <= width);

		// Nothing to cut, nothing to add
		let block = layout_text(&measurer, &runs, f32::INFINITY, Some(2));
		assert!(!texts(&block)[0].contains('\u{2026}'));
	}
}
