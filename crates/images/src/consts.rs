pub const SVG_SIGNATURES: [&str; 2] = ["<svg", "<?xml"];

/// Longest edge, in pixels, of any image we embed into a thumbnail.
///
/// Avatars are drawn at a fraction of that, so there's no point in carrying more pixels around.
pub const EMBED_MAX_EDGE: u32 = 512;

/// The target edge, in pixels, SVG sub-images are rasterized to
pub(crate) const SVG_TARGET_PX: u32 = EMBED_MAX_EDGE;

pub(crate) const JPEG_QUALITY: u8 = 85;

/// Largest SVG source, in bytes, we are willing to rasterize for embedding
pub(crate) const SVG_MAXIMUM_FILE_SIZE: usize = MIB * 24;

/// Largest raster image, in bytes, we are willing to decode for embedding
pub(crate) const GENERIC_MAXIMUM_FILE_SIZE: usize = MIB * 24;

/// The size of 1MiB in bytes
const MIB: usize = 1_048_576;
