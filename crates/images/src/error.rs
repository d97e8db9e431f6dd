pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("error with usvg: {0}")]
	USvg(#[from] resvg::usvg::Error),
	#[error("failed to allocate `Pixbuf` while converting an SVG")]
	Pixbuf,
	#[error("error while loading the image (via the `image` crate): {0}")]
	Image(#[from] image::ImageError),
	#[error("there was an error while converting the image to an `RgbaImage`")]
	RgbImageConversion,
	#[error("the image provided is unsupported")]
	Unsupported,
	#[error("the image provided is empty")]
	Empty,
	#[error("the image provided is too large ({size} bytes, limit is {limit})")]
	TooLarge { size: usize, limit: usize },
	#[error("the image has invalid dimensions")]
	InvalidLength,
}
