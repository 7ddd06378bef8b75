//! Raw artwork candidates as returned by a source

use image::ImageFormat;

use crate::core::ContentHash;
use crate::processing::image::{probe_dimensions, sniff_format, DecodeError};

/// One retrieved, not-yet-validated image. Immutable once created.
#[derive(Debug, Clone)]
pub struct RawCandidate {
	source_id: String,
	bytes: Vec<u8>,
	width: u32,
	height: u32,
	format: Option<ImageFormat>,
	hash: ContentHash,
}

impl RawCandidate {
	/// Build a candidate from encoded image bytes, reading dimensions from the header
	pub fn from_bytes(source_id: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DecodeError> {
		let (width, height) = probe_dimensions(&bytes)?;
		let format = sniff_format(&bytes);
		let hash = ContentHash::compute(&bytes);

		Ok(Self {
			source_id: source_id.into(),
			bytes,
			width,
			height,
			format,
			hash,
		})
	}

	pub fn source_id(&self) -> &str {
		&self.source_id
	}

	pub fn bytes(&self) -> &[u8] {
		&self.bytes
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

	/// Pixel area, used to prefer higher resolutions
	pub fn area(&self) -> u64 {
		u64::from(self.width) * u64::from(self.height)
	}

	pub fn format(&self) -> Option<ImageFormat> {
		self.format
	}

	pub fn content_hash(&self) -> &ContentHash {
		&self.hash
	}

	/// Short label for logging: `source:hash WxH`
	pub fn label(&self) -> String {
		format!(
			"{}:{} {}x{}",
			self.source_id,
			self.hash.short(),
			self.width,
			self.height
		)
	}
}
