//! Final, embeddable artwork

use image::ImageFormat;

/// Normalized image ready to hand to a tag writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArtwork {
	bytes: Vec<u8>,
	format: ImageFormat,
	width: u32,
	height: u32,
	reencoded: bool,
}

impl NormalizedArtwork {
	pub(crate) fn new(bytes: Vec<u8>, format: ImageFormat, width: u32, height: u32, reencoded: bool) -> Self {
		Self {
			bytes,
			format,
			width,
			height,
			reencoded,
		}
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.bytes
	}

	pub fn format(&self) -> ImageFormat {
		self.format
	}

	/// MIME type matching the final encoding
	pub fn mime_type(&self) -> &'static str {
		self.format.to_mime_type()
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn byte_size(&self) -> usize {
		self.bytes.len()
	}

	/// Whether the bytes differ from the source candidate's
	pub fn was_reencoded(&self) -> bool {
		self.reencoded
	}
}
