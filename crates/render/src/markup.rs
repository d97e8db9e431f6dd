use crate::{RenderError, Result};

use resvg::usvg::roxmltree;
use tracing::trace;

/// A self-contained document: one stylesheet plus an XHTML-like body.
///
/// Nothing outside of it is available while rendering, images must be inlined as `data:` URIs
/// and fonts come from the [`FontSet`](crate::FontSet) the render is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupSnapshot {
	pub style: String,
	pub body: String,
}

impl MarkupSnapshot {
	pub fn new(style: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			style: style.into(),
			body: body.into(),
		}
	}

	/// The single fragment form, `<style>` first and then the body
	#[must_use]
	pub fn compose(&self) -> String {
		format!("<style>{}</style>{}", self.style, self.body)
	}

	/// Parses the body into an element tree rooted at an implicit element covering the canvas.
	///
	/// `<style>` elements found in the body are pulled out and returned as extra stylesheets, so
	/// a composed fragment renders the same as the snapshot it came from.
	pub(crate) fn parse_body(&self) -> Result<(Element, Vec<String>)> {
		let wrapped = format!("<root>{}</root>", self.body);
		let document = roxmltree::Document::parse(&wrapped)
			.map_err(|e| RenderError::MalformedDocument(e.to_string()))?;

		let mut stylesheets = vec![];
		let root = convert(document.root_element(), &mut stylesheets);

		Ok((root, stylesheets))
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
	Element(Element),
	Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
	pub tag: String,
	pub id: Option<String>,
	pub classes: Vec<String>,
	pub style: Option<String>,
	pub src: Option<String>,
	pub children: Vec<Node>,
}

fn convert(node: roxmltree::Node<'_, '_>, stylesheets: &mut Vec<String>) -> Element {
	let mut element = Element {
		tag: node.tag_name().name().to_ascii_lowercase(),
		id: node.attribute("id").map(ToOwned::to_owned),
		classes: node
			.attribute("class")
			.map(|classes| classes.split_whitespace().map(ToOwned::to_owned).collect())
			.unwrap_or_default(),
		style: node.attribute("style").map(ToOwned::to_owned),
		src: node.attribute("src").map(ToOwned::to_owned),
		children: vec![],
	};

	for child in node.children() {
		if child.is_element() {
			if child.tag_name().name().eq_ignore_ascii_case("style") {
				stylesheets.extend(child.text().map(ToOwned::to_owned));
				continue;
			}
			element
				.children
				.push(Node::Element(convert(child, stylesheets)));
		} else if child.is_text() {
			if let Some(text) = child.text() {
				element.children.push(Node::Text(text.to_owned()));
			}
		} else {
			trace!("Skipping comment or processing instruction");
		}
	}

	element
}

/// Escapes text for both XML content and attribute values.
///
/// Characters XML 1.0 can't carry at all, even as references, are dropped.
pub(crate) fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&apos;"),
			c if !is_xml_char(c) => trace!(?c, "Dropping a character XML can't represent"),
			c => out.push(c),
		}
	}
	out
}

const fn is_xml_char(c: char) -> bool {
	matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
}
