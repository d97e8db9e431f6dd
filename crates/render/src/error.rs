use resvg::usvg;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
	#[error("malformed document: {0}")]
	MalformedDocument(String),
	#[error("font '{family}' weight {weight} is used by the document but was not supplied")]
	MissingFont { family: String, weight: u16 },
	#[error("document references an external resource: '{0}'")]
	ExternalResource(String),
	#[error("supplied font '{family}' weight {weight} could not be parsed")]
	InvalidFont { family: String, weight: u16 },
	#[error("supplied font keyed as '{family}' weight {weight} identifies itself as {found}")]
	FontMismatch {
		family: String,
		weight: u16,
		found: String,
	},
	#[error("layout failed: {0}")]
	Layout(#[from] taffy::TaffyError),
	#[error("invalid canvas size {width}x{height}")]
	InvalidSize { width: u32, height: u32 },
	#[error("vector graphic rejected by the rasterizer: {0}")]
	Vector(#[from] usvg::Error),
	#[error("failed to allocate a {width}x{height} pixmap")]
	Pixmap { width: u32, height: u32 },
	#[error("failed to encode the raster image: {0}")]
	Encode(#[from] image::ImageError),
}
