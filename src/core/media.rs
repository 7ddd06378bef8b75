//! Image file detection

use std::path::Path;

use image::ImageFormat;

use crate::config::IMAGE_EXTENSIONS;

/// Detect image files from their extension
pub fn is_image_file(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Preferred file extension for an encoded format
pub fn extension_for(format: ImageFormat) -> &'static str {
	format.extensions_str().first().copied().unwrap_or("img")
}
