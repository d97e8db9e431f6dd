//! Box layout over the styled tree. `taffy` does block flow and flexbox, inline text is the one
//! thing measured here, through its measure function.

use crate::{
	markup::{Element, Node},
	style::{ComputedStyle, Display, Edges, Length, Stylesheet},
	text::{self, Run, TextBlock, TextMeasurer},
	Result,
};

use taffy::{
	geometry::{Rect, Size},
	prelude::{NodeId, TaffyTree},
	style::{AvailableSpace, Dimension, LengthPercentage, LengthPercentageAuto, Style},
};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StyledNode {
	pub tag: String,
	pub style: ComputedStyle,
	pub src: Option<String>,
	pub children: Vec<StyledChild>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StyledChild {
	Element(StyledNode),
	/// Text takes the style of the element it sits in
	Text(String),
}

impl StyledNode {
	pub fn build(element: &Element, sheet: &Stylesheet, parent: &ComputedStyle) -> Self {
		let style = sheet.compute(element, parent);

		let children = element
			.children
			.iter()
			.filter_map(|child| match child {
				Node::Text(text) => Some(StyledChild::Text(text.clone())),
				Node::Element(child) => {
					let child = Self::build(child, sheet, &style);
					(child.style.display != Display::None).then_some(StyledChild::Element(child))
				}
			})
			.collect();

		Self {
			tag: element.tag.clone(),
			style,
			src: element.src.clone(),
			children,
		}
	}

	pub fn is_image(&self) -> bool {
		self.tag == "img"
	}

	/// Every node of the tree, depth first, starting with this one
	pub fn walk(&self, visit: &mut impl FnMut(&Self)) {
		visit(self);
		for child in &self.children {
			if let StyledChild::Element(child) = child {
				child.walk(visit);
			}
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
	Empty,
	Text(TextBlock),
	Image(String),
}

/// A laid out box, positioned relative to its parent's border box
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayoutBox {
	pub x: f32,
	pub y: f32,
	pub width: f32,
	pub height: f32,
	/// `None` for the anonymous boxes wrapping inline text
	pub style: Option<ComputedStyle>,
	pub content: Content,
	pub children: Vec<LayoutBox>,
}

impl LayoutBox {
	/// Corner radius, percentages against the shorter side
	pub fn radius(&self) -> f32 {
		self.style
			.as_ref()
			.and_then(|style| style.border_radius)
			.map_or(0.0, |radius| {
				radius
					.resolve(self.width.min(self.height))
					.clamp(0.0, self.width.min(self.height) / 2.0)
			})
	}
}

/// What a container lays out: element boxes, and runs of inline content between them
enum Item<'n> {
	Node(&'n StyledNode),
	Inline {
		runs: Vec<Run>,
		container: &'n ComputedStyle,
	},
}

/// Context of the leaves taffy can't size on its own
#[derive(Debug)]
struct InlineText {
	runs: Vec<Run>,
	clamp: Option<usize>,
}

/// Ties a taffy node back to what it was built from
struct Built<'n> {
	id: NodeId,
	node: Option<&'n StyledNode>,
	children: Vec<Built<'n>>,
}

pub(crate) struct LayoutContext<'m, 'f> {
	measurer: &'m TextMeasurer<'f>,
}

impl<'m, 'f> LayoutContext<'m, 'f> {
	pub fn new(measurer: &'m TextMeasurer<'f>) -> Self {
		Self { measurer }
	}

	/// The root always covers the whole canvas, whatever its own style says
	pub fn layout_root(&self, root: &StyledNode, width: f32, height: f32) -> Result<LayoutBox> {
		let mut tree = TaffyTree::new();
		// Fractional positions survive into the SVG
		tree.disable_rounding();

		let built = self.build(&mut tree, root)?;

		let mut style = tree.style(built.id)?.clone();
		style.size = Size {
			width: Dimension::Length(width),
			height: Dimension::Length(height),
		};
		tree.set_style(built.id, style)?;

		tree.compute_layout_with_measure(
			built.id,
			Size {
				width: AvailableSpace::Definite(width),
				height: AvailableSpace::Definite(height),
			},
			|known, available, _, text, _| self.measure(known, available, text),
		)?;

		self.extract(&tree, &built)
	}

	fn build<'n>(
		&self,
		tree: &mut TaffyTree<InlineText>,
		node: &'n StyledNode,
	) -> Result<Built<'n>> {
		let style = box_style(&node.style, node.is_image());

		let mut children = vec![];
		if !node.is_image() {
			for item in self.items(node) {
				children.push(match item {
					Item::Node(child) => self.build(tree, child)?,
					Item::Inline { runs, container } => Built {
						id: tree.new_leaf_with_context(
							Style::default(),
							InlineText {
								runs,
								clamp: container.line_clamp,
							},
						)?,
						node: None,
						children: vec![],
					},
				});
			}
		}

		let ids = children.iter().map(|child| child.id).collect::<Vec<_>>();

		Ok(Built {
			id: tree.new_with_children(style, &ids)?,
			node: Some(node),
			children,
		})
	}

	/// Text shrinks to fit but never below its widest word
	fn measure(
		&self,
		known: Size<Option<f32>>,
		available: Size<AvailableSpace>,
		text: Option<&mut InlineText>,
	) -> Size<f32> {
		let Some(InlineText { runs, clamp }) = text else {
			return Size::ZERO;
		};

		let width = known.width.unwrap_or_else(|| match available.width {
			AvailableSpace::MinContent => text::min_content_width(self.measurer, runs),
			AvailableSpace::MaxContent => text::max_content_width(self.measurer, runs),
			AvailableSpace::Definite(available) => text::max_content_width(self.measurer, runs)
				.min(available.max(text::min_content_width(self.measurer, runs))),
		});

		let height = known
			.height
			.unwrap_or_else(|| text::layout_text(self.measurer, runs, width, *clamp).height);

		Size { width, height }
	}

	fn extract(&self, tree: &TaffyTree<InlineText>, built: &Built<'_>) -> Result<LayoutBox> {
		let layout = tree.layout(built.id)?;
		let (width, height) = (layout.size.width, layout.size.height);

		let content = match built.node {
			Some(node) if node.is_image() => Content::Image(node.src.clone().unwrap_or_default()),
			Some(_) => Content::Empty,
			None => tree
				.get_node_context(built.id)
				.map_or(Content::Empty, |text| {
					Content::Text(text::layout_text(self.measurer, &text.runs, width, text.clamp))
				}),
		};

		Ok(LayoutBox {
			x: layout.location.x,
			y: layout.location.y,
			width,
			height,
			style: built.node.map(|node| node.style.clone()),
			content,
			children: built
				.children
				.iter()
				.map(|child| self.extract(tree, child))
				.collect::<Result<_>>()?,
		})
	}

	fn items<'n>(&self, node: &'n StyledNode) -> Vec<Item<'n>> {
		let mut items = vec![];
		let mut runs = vec![];

		for child in &node.children {
			match child {
				StyledChild::Text(text) => runs.push(Run {
					text: text.clone(),
					style: self.measurer.text_style(&node.style),
				}),
				StyledChild::Element(child)
					if child.style.display == Display::Inline && !child.is_image() =>
				{
					self.inline_runs(child, &mut runs);
				}
				StyledChild::Element(child) => {
					flush_runs(&mut runs, &mut items, &node.style);
					items.push(Item::Node(child));
				}
			}
		}
		flush_runs(&mut runs, &mut items, &node.style);

		items
	}

	/// Everything inside an inline element flows as text, nested boxes included
	fn inline_runs(&self, node: &StyledNode, runs: &mut Vec<Run>) {
		for child in &node.children {
			match child {
				StyledChild::Text(text) => runs.push(Run {
					text: text.clone(),
					style: self.measurer.text_style(&node.style),
				}),
				StyledChild::Element(child) => {
					if child.is_image() {
						trace!("Dropping an image nested in inline content");
					} else {
						self.inline_runs(child, runs);
					}
				}
			}
		}
	}
}

fn flush_runs<'n>(runs: &mut Vec<Run>, items: &mut Vec<Item<'n>>, container: &'n ComputedStyle) {
	if runs.iter().any(|run| !run.text.trim().is_empty()) {
		items.push(Item::Inline {
			runs: std::mem::take(runs),
			container,
		});
	} else {
		// Whitespace between blocks is not content
		runs.clear();
	}
}

fn box_style(style: &ComputedStyle, image: bool) -> Style {
	let gap = match style.gap {
		Length::Px(px) => LengthPercentage::Length(px),
		Length::Percent(fraction) => LengthPercentage::Percent(fraction),
	};

	Style {
		display: match style.display {
			Display::Flex => taffy::style::Display::Flex,
			// Inline elements only get here as images, they sit in the flow like blocks
			Display::Block | Display::Inline => taffy::style::Display::Block,
			Display::None => taffy::style::Display::None,
		},
		size: Size {
			width: dimension(style.width),
			height: dimension(style.height),
		},
		// No intrinsic size to go by, avatars and logos are square
		aspect_ratio: image.then_some(1.0),
		padding: edges(style.padding, LengthPercentage::Length),
		margin: edges(style.margin, LengthPercentageAuto::Length),
		gap: Size {
			width: gap,
			height: gap,
		},
		flex_direction: style.flex_direction,
		flex_grow: style.flex_grow,
		flex_shrink: style.flex_shrink,
		align_items: style.align_items,
		justify_content: style.justify_content,
		..Style::default()
	}
}

fn dimension(length: Option<Length>) -> Dimension {
	match length {
		Some(Length::Px(px)) => Dimension::Length(px),
		Some(Length::Percent(fraction)) => Dimension::Percent(fraction),
		None => Dimension::Auto,
	}
}

fn edges<T>(edges: Edges, px: impl Fn(f32) -> T) -> Rect<T> {
	Rect {
		left: px(edges.left),
		right: px(edges.right),
		top: px(edges.top),
		bottom: px(edges.bottom),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::{text::tests::fixture_fonts, MarkupSnapshot};

	fn layout(style: &str, body: &str, width: f32, height: f32) -> LayoutBox {
		let fonts = fixture_fonts();
		let measurer = TextMeasurer::new(&fonts).unwrap();
		let (root, _) = MarkupSnapshot::new(style, body).parse_body().unwrap();
		let styled = StyledNode::build(
			&root,
			&Stylesheet::parse(style),
			&ComputedStyle::root("DejaVu Sans", 16.0),
		);

		LayoutContext::new(&measurer)
			.layout_root(&styled, width, height)
			.unwrap()
	}

	fn approx(a: f32, b: f32) -> bool {
		(a - b).abs() < 0.01
	}

	#[test]
	fn root_covers_the_canvas() {
		let root = layout("", "", 1200.0, 648.0);

		assert!(approx(root.width, 1200.0) && approx(root.height, 648.0));
		assert!(root.children.is_empty());
	}

	#[test]
	fn blocks_stack_with_padding_and_margins() {
		let root = layout(
			".box { height: 100px; margin-bottom: 10px } .wrap { padding: 20px }",
			"<div class=\"wrap\"><div class=\"box\"/><div class=\"box\"/></div>",
			400.0,
			400.0,
		);

		let wrap = &root.children[0];
		assert!(approx(wrap.height, 20.0 + 110.0 + 110.0 + 20.0), "{}", wrap.height);
		let [first, second] = &wrap.children[..] else {
			panic!("expected two boxes");
		};
		assert!(approx(first.x, 20.0) && approx(first.y, 20.0));
		assert!(approx(first.width, 360.0));
		assert!(approx(second.y, 130.0));
	}

	#[test]
	fn centers_in_a_flex_column() {
		let root = layout(
			".card { width: 100%; height: 100%; display: flex; flex-direction: column; \
			 justify-content: center; align-items: center } .dot { width: 40px; height: 20px }",
			"<div class=\"card\"><div class=\"dot\"/></div>",
			200.0,
			100.0,
		);

		let dot = &root.children[0].children[0];
		assert!(approx(dot.x, 80.0), "{}", dot.x);
		assert!(approx(dot.y, 40.0), "{}", dot.y);
	}

	#[test]
	fn rows_shrink_text_and_keep_fixed_boxes() {
		let root = layout(
			".row { display: flex; gap: 10px; align-items: center } \
			 .avatar { width: 50px; height: 50px; flex-shrink: 0 }",
			"<div class=\"row\"><img class=\"avatar\" src=\"data:image/png;base64,AA==\"/>\
			 <p>a sentence long enough that it can never fit on a single line of a narrow row</p></div>",
			300.0,
			300.0,
		);

		let row = &root.children[0];
		let [avatar, text] = &row.children[..] else {
			panic!("expected two boxes");
		};

		assert!(approx(avatar.width, 50.0));
		assert!(matches!(avatar.content, Content::Image(_)));
		assert!(approx(text.x, 60.0));
		assert!(approx(text.width, 240.0), "{}", text.width);
		assert!(text.height > 50.0);
		assert!(approx(row.height, text.height));
		// Centered against the taller text
		assert!(approx(avatar.y, (text.height - 50.0) / 2.0));

		// The paragraph's only child is its text, wrapped to the shrunk width
		let Content::Text(block) = &text.children[0].content else {
			panic!("expected text");
		};
		assert!(block.lines.len() > 1);
		assert!(block.lines.iter().all(|line| line.width <= 240.0));
	}

	#[test]
	fn space_between() {
		let root = layout(
			".row { display: flex; justify-content: space-between } .a { width: 10px; height: 5px }",
			"<div class=\"row\"><div class=\"a\"/><div class=\"a\"/><div class=\"a\"/></div>",
			110.0,
			50.0,
		);

		let xs = root.children[0]
			.children
			.iter()
			.map(|child| child.x)
			.collect::<Vec<_>>();
		assert!(approx(xs[0], 0.0) && approx(xs[1], 50.0) && approx(xs[2], 100.0), "{xs:?}");
	}

	#[test]
	fn percentages_resolve_against_the_content_box() {
		let root = layout(
			".wrap { display: flex; flex-direction: column; gap: 10px; padding: 10px; height: 200px } \
			 .half { width: 50%; height: 25% }",
			"<div class=\"wrap\"><div class=\"half\"/><div class=\"half\"/></div>",
			400.0,
			400.0,
		);

		let [first, second] = &root.children[0].children[..] else {
			panic!("expected two boxes");
		};
		assert!(approx(first.width, 190.0), "{}", first.width);
		assert!(approx(first.height, 45.0), "{}", first.height);
		assert!(approx(second.y, 10.0 + 45.0 + 10.0), "{}", second.y);
	}

	#[test]
	fn free_space_goes_to_growing_items() {
		let root = layout(
			".row { display: flex; width: 100px } .grow { flex-grow: 1; height: 5px } \
			 .fixed { width: 30px; height: 5px }",
			"<div class=\"row\"><div class=\"fixed\"/><div class=\"grow\"/></div>",
			200.0,
			50.0,
		);

		let grow = &root.children[0].children[1];
		assert!(approx(grow.x, 30.0) && approx(grow.width, 70.0), "{grow:?}");
	}

	#[test]
	fn images_without_a_height_are_square() {
		let root = layout(
			".logo { width: 64px }",
			"<img class=\"logo\" src=\"data:image/png;base64,AA==\"/>",
			200.0,
			200.0,
		);

		assert!(approx(root.children[0].height, 64.0));
	}

	#[test]
	fn display_none_is_dropped() {
		let root = layout(
			".hidden { display: none }",
			"<div class=\"hidden\">gone</div><p>kept</p>",
			100.0,
			100.0,
		);

		assert_eq!(root.children.len(), 1);
	}

	#[test]
	fn radius_is_capped() {
		let root = layout(
			".round { width: 40px; height: 20px; border-radius: 50% } .pill { width: 40px; height: 20px; border-radius: 999px }",
			"<div class=\"round\"/><div class=\"pill\"/>",
			100.0,
			100.0,
		);

		assert!(approx(root.children[0].radius(), 10.0));
		assert!(approx(root.children[1].radius(), 10.0));
	}
}
