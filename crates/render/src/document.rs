use crate::{markup::escape, MarkupSnapshot};

/// Anything that can produce a markup snapshot
pub trait Document {
	fn snapshot(&self) -> MarkupSnapshot;
}

impl Document for MarkupSnapshot {
	fn snapshot(&self) -> MarkupSnapshot {
		self.clone()
	}
}

/// The one family and two weights every template is drawn with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typography {
	pub family: String,
	pub regular: u16,
	pub bold: u16,
}

impl Typography {
	pub fn new(family: impl Into<String>, regular: u16, bold: u16) -> Self {
		Self {
			family: family.into(),
			regular,
			bold,
		}
	}

	/// The weights a template needs resolved before rendering
	#[must_use]
	pub const fn weights(&self) -> [u16; 2] {
		[self.regular, self.bold]
	}

	fn stylesheet(&self, rules: &str) -> String {
		let Self {
			family,
			regular,
			bold,
		} = self;
		let family = family.replace(['\'', '"', ';', '{', '}'], "");

		// Every text element names its weight, so a missing face is caught before layout
		format!(
			".card {{ width: 100%; height: 100%; display: flex; flex-direction: column; \
			 justify-content: center; gap: 40px; padding: 72px 96px; background-color: #ffffff; \
			 color: #111827; font-family: '{family}'; font-weight: {regular} }}\n\
			 .regular {{ font-weight: {regular} }}\n\
			 .bold {{ font-weight: {bold} }}\n\
			 .placeholder {{ display: flex; align-items: center; justify-content: center; \
			 background-color: #e5e7eb; color: #4b5563 }}\n\
			 {rules}"
		)
	}
}

impl Default for Typography {
	fn default() -> Self {
		Self::new("Inter", 500, 700)
	}
}

/// Share card of an assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantCard {
	pub name: String,
	pub description: Option<String>,
	pub created_by: Option<String>,
	/// Inline `data:` URI, the placeholder is drawn when absent
	pub avatar: Option<String>,
	pub typography: Typography,
}

impl Document for AssistantCard {
	fn snapshot(&self) -> MarkupSnapshot {
		let style = self.typography.stylesheet(
			".header { display: flex; align-items: center; gap: 40px }\n\
			 .avatar { width: 160px; height: 160px; flex-shrink: 0; border-radius: 50% }\n\
			 .initial { font-size: 72px; line-height: 1 }\n\
			 .titles { display: flex; flex-direction: column; gap: 12px }\n\
			 .name { font-size: 64px; line-height: 1.15; -webkit-line-clamp: 2 }\n\
			 .author { font-size: 30px; color: #6b7280 }\n\
			 .description { font-size: 34px; line-height: 1.4; color: #374151; -webkit-line-clamp: 3 }\n",
		);

		let mut body = String::from("<div class=\"card\"><div class=\"header\">");
		body.push_str(&avatar_slot(self.avatar.as_deref(), &self.name, "avatar"));
		body.push_str("<div class=\"titles\">");
		body.push_str(&format!(
			"<h1 class=\"name bold\">{}</h1>",
			escape(self.name.trim())
		));
		if let Some(created_by) = non_empty(self.created_by.as_deref()) {
			body.push_str(&format!(
				"<p class=\"author regular\">Created by <span class=\"bold\">{}</span></p>",
				escape(created_by)
			));
		}
		body.push_str("</div></div>");
		if let Some(description) = non_empty(self.description.as_deref()) {
			body.push_str(&format!(
				"<p class=\"description regular\">{}</p>",
				escape(description)
			));
		}
		body.push_str("</div>");

		MarkupSnapshot::new(style, body)
	}
}

/// Share card of a model page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCard {
	/// Full model id, `organization/name` is shown with the organization dimmed
	pub name: String,
	pub logo: Option<String>,
	pub typography: Typography,
}

impl Document for ModelCard {
	fn snapshot(&self) -> MarkupSnapshot {
		let style = self.typography.stylesheet(
			".logo { width: 128px; height: 128px; flex-shrink: 0; border-radius: 24px }\n\
			 .initial { font-size: 64px; line-height: 1 }\n\
			 .name { font-size: 72px; line-height: 1.15; -webkit-line-clamp: 3 }\n\
			 .organization { color: #6b7280 }\n",
		);

		let name = self.name.trim();
		let title = match name.rsplit_once('/') {
			Some((organization, model)) if !organization.is_empty() && !model.is_empty() => {
				format!(
					"<span class=\"organization regular\">{}/</span>{}",
					escape(organization),
					escape(model)
				)
			}
			_ => escape(name),
		};

		let body = format!(
			"<div class=\"card\">{}<h1 class=\"name bold\">{title}</h1></div>",
			avatar_slot(self.logo.as_deref(), name.rsplit('/').next().unwrap_or(name), "logo"),
		);

		MarkupSnapshot::new(style, body)
	}
}

fn non_empty(text: Option<&str>) -> Option<&str> {
	text.map(str::trim).filter(|text| !text.is_empty())
}

/// The image when there is one, the capitalized initial of `name` on a tinted square otherwise
fn avatar_slot(image: Option<&str>, name: &str, class: &str) -> String {
	match image {
		Some(src) => format!("<img class=\"{class}\" src=\"{}\"/>", escape(src)),
		None => {
			let initial = name
				.chars()
				.find(|c| c.is_alphanumeric())
				.map_or_else(|| "?".to_owned(), |c| c.to_uppercase().collect());

			format!(
				"<div class=\"{class} placeholder\"><div class=\"initial bold\">{}</div></div>",
				escape(&initial)
			)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::{text::tests::fixture_fonts, RenderPipeline, RenderRequest};

	fn assistant() -> AssistantCard {
		AssistantCard {
			name: "  <Writing> Coach".to_owned(),
			description: Some("Helps you write & edit.".to_owned()),
			created_by: Some("ada".to_owned()),
			avatar: None,
			typography: Typography::new("DejaVu Sans", 400, 700),
		}
	}

	#[test]
	fn assistant_card_escapes_user_text() {
		let snapshot = assistant().snapshot();

		assert!(snapshot.body.contains("&lt;Writing&gt; Coach"));
		assert!(snapshot.body.contains("Helps you write &amp; edit."));
		assert!(snapshot.body.contains("Created by <span class=\"bold\">ada</span>"));
		assert!(snapshot.style.contains("font-family: 'DejaVu Sans'"));
		snapshot.parse_body().unwrap();
	}

	#[test]
	fn placeholder_shows_the_initial() {
		let snapshot = assistant().snapshot();
		assert!(snapshot
			.body
			.contains("<div class=\"avatar placeholder\"><div class=\"initial bold\">W</div></div>"));

		let card = AssistantCard {
			avatar: Some("data:image/jpeg;base64,AAAA".to_owned()),
			..assistant()
		};
		let snapshot = card.snapshot();
		assert!(snapshot
			.body
			.contains("<img class=\"avatar\" src=\"data:image/jpeg;base64,AAAA\"/>"));
		assert!(!snapshot.body.contains("placeholder\">"));
	}

	#[test]
	fn optional_fields_are_left_out() {
		let card = AssistantCard {
			description: Some("   ".to_owned()),
			created_by: None,
			..assistant()
		};

		let body = card.snapshot().body;
		assert!(!body.contains("description"));
		assert!(!body.contains("Created by"));
	}

	#[test]
	fn model_card_dims_the_organization() {
		let card = ModelCard {
			name: "meta-llama/Llama-3-70b".to_owned(),
			logo: None,
			typography: Typography::default(),
		};

		let snapshot = card.snapshot();
		assert!(snapshot.body.contains(
			"<h1 class=\"name bold\"><span class=\"organization regular\">meta-llama/</span>Llama-3-70b</h1>"
		));
		assert!(snapshot.body.contains("<div class=\"initial bold\">L</div>"));
		assert!(snapshot.style.contains(".bold { font-weight: 700 }"));
		assert_eq!(card.typography.weights(), [500, 700]);
		snapshot.parse_body().unwrap();
	}

	#[test]
	fn control_characters_in_user_text_still_render() {
		let card = AssistantCard {
			name: "Coach\u{000B}Bot".to_owned(),
			description: Some("line\u{0008}feed\u{ffff}".to_owned()),
			..assistant()
		};

		let snapshot = card.snapshot();
		assert!(snapshot.body.contains("CoachBot"));
		assert!(snapshot.body.contains("linefeed"));

		let image = RenderPipeline::new()
			.render(&RenderRequest::new(&card, 600, 324, fixture_fonts()))
			.unwrap();
		assert_eq!((image.width, image.height), (600, 324));
	}
}
