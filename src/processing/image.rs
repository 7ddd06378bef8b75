//! Image decoding, probing and encoding helpers

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use thiserror::Error;
use zune_core::{colorspace::ColorSpace, options::DecoderOptions};
use zune_jpeg::JpegDecoder;

#[derive(Debug, Error)]
pub enum DecodeError {
	#[error("unrecognized or corrupt image data ({0} bytes)")]
	Unreadable(usize),

	#[error("image has zero width or height")]
	Empty,

	#[error("failed to encode image: {0}")]
	Encode(String),
}

fn looks_like_jpeg(bytes: &[u8]) -> bool {
	bytes.len() >= 2 && bytes[0] == 0xff && bytes[1] == 0xd8
}

fn decode_jpeg_non_strict(bytes: &[u8]) -> Option<DynamicImage> {
	if !looks_like_jpeg(bytes) {
		return None;
	}

	let options = DecoderOptions::new_cmd()
		.set_strict_mode(false)
		.jpeg_set_out_colorspace(ColorSpace::RGBA);
	let mut decoder = JpegDecoder::new_with_options(bytes, options);
	let pixels = decoder.decode().ok()?;
	let (width, height) = decoder.dimensions()?;
	let image = image::RgbaImage::from_raw(width as u32, height as u32, pixels)?;
	Some(DynamicImage::ImageRgba8(image))
}

/// Decode encoded image bytes.
///
/// The primary `image` decoder covers PNG/WebP/GIF/BMP/etc; a non-strict
/// JPEG pass only runs when it fails (trailing garbage, truncated markers).
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
	let image = image::load_from_memory(bytes)
		.ok()
		.or_else(|| decode_jpeg_non_strict(bytes))
		.ok_or(DecodeError::Unreadable(bytes.len()))?;

	if image.width() == 0 || image.height() == 0 {
		return Err(DecodeError::Empty);
	}
	Ok(image)
}

/// Read dimensions from the header, decoding fully only as a fallback
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
	let from_header = ImageReader::new(Cursor::new(bytes))
		.with_guessed_format()
		.ok()
		.and_then(|reader| reader.into_dimensions().ok());

	let (width, height) = match from_header {
		Some(dims) => dims,
		None => {
			let decoded = decode(bytes)?;
			(decoded.width(), decoded.height())
		}
	};

	if width == 0 || height == 0 {
		return Err(DecodeError::Empty);
	}
	Ok((width, height))
}

/// Sniff the container format from magic bytes
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
	image::guess_format(bytes).ok()
}

/// Formats every tag container (ID3 APIC, MP4 covr, FLAC PICTURE) accepts
pub fn is_embeddable(format: ImageFormat) -> bool {
	matches!(format, ImageFormat::Jpeg | ImageFormat::Png)
}

/// Drop alpha by compositing onto a white background
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
	if !image.color().has_alpha() {
		return image.to_rgb8();
	}

	let rgba = image.to_rgba8();
	RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
		let [r, g, b, a] = rgba.get_pixel(x, y).0;
		let alpha = u32::from(a);
		let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
		Rgb([blend(r), blend(g), blend(b)])
	})
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, DecodeError> {
	let mut encoded = Vec::new();
	JpegEncoder::new_with_quality(&mut encoded, quality)
		.encode_image(image)
		.map_err(|e| DecodeError::Encode(e.to_string()))?;
	Ok(encoded)
}

/// Scale dimensions so the long edge is at most `max_edge`, keeping aspect ratio
pub fn fit_to_max_edge(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
	if width == 0 || height == 0 {
		return (1, 1);
	}
	let clamped = max_edge.max(1);
	if width.max(height) <= clamped {
		return (width, height);
	}
	if width >= height {
		let scaled_height =
			((u64::from(height) * u64::from(clamped)) + (u64::from(width) / 2)) / u64::from(width);
		(clamped, scaled_height.max(1) as u32)
	} else {
		let scaled_width =
			((u64::from(width) * u64::from(clamped)) + (u64::from(height) / 2)) / u64::from(height);
		(scaled_width.max(1) as u32, clamped)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::{encode_png, solid_png};
	use image::{GenericImageView, ImageBuffer, Rgba};

	#[test]
	fn test_fit_to_max_edge_preserves_aspect_ratio() {
		assert_eq!(fit_to_max_edge(2000, 1000, 320), (320, 160));
		assert_eq!(fit_to_max_edge(1000, 2000, 320), (160, 320));
		assert_eq!(fit_to_max_edge(128, 64, 320), (128, 64));
	}

	fn jpeg_with_trailing_garbage() -> Vec<u8> {
		let rgb = RgbImage::from_pixel(12, 9, Rgb([90, 140, 210]));
		let mut encoded = encode_jpeg(&rgb, 85).expect("jpeg encoding should succeed");
		encoded.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
		encoded
	}

	#[test]
	fn test_non_strict_jpeg_decoder_ignores_trailing_garbage() {
		let decoded = decode_jpeg_non_strict(&jpeg_with_trailing_garbage())
			.expect("non-strict decoder should decode jpeg bytes");
		assert_eq!(decoded.dimensions(), (12, 9));
		let [r, g, b, a] = decoded.to_rgba8().get_pixel(6, 4).0;
		assert!(r.abs_diff(90) <= 8 && g.abs_diff(140) <= 8 && b.abs_diff(210) <= 8);
		assert_eq!(a, 255);
	}

	#[test]
	fn test_non_strict_jpeg_decoder_skips_other_formats() {
		assert!(decode_jpeg_non_strict(&solid_png(4, 4, [1, 2, 3])).is_none());
		assert!(decode_jpeg_non_strict(&[0xff]).is_none());
	}

	#[test]
	fn test_decode_jpeg_with_trailing_garbage() {
		let decoded = decode(&jpeg_with_trailing_garbage()).expect("jpeg should decode");
		assert_eq!(decoded.dimensions(), (12, 9));
	}

	#[test]
	fn test_decode_rejects_non_image_bytes() {
		assert!(matches!(
			decode(b"definitely-not-an-image"),
			Err(DecodeError::Unreadable(23))
		));
	}

	#[test]
	fn test_probe_reads_png_header() {
		let png = solid_png(7, 5, [8, 16, 24]);
		assert_eq!(probe_dimensions(&png).unwrap(), (7, 5));
		assert_eq!(sniff_format(&png), Some(ImageFormat::Png));
	}

	#[test]
	fn test_probe_rejects_garbage() {
		assert!(probe_dimensions(&[0u8; 64]).is_err());
		assert_eq!(sniff_format(b"text"), None);
	}

	#[test]
	fn test_flatten_composites_transparent_pixels_onto_white() {
		let source = DynamicImage::ImageRgba8(ImageBuffer::from_fn(2, 1, |x, _| {
			if x == 0 {
				Rgba([0, 0, 0, 0])
			} else {
				Rgba([10, 20, 30, 255])
			}
		}));
		let flat = flatten_onto_white(&source);
		assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
		assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
	}

	#[test]
	fn test_embeddable_formats() {
		assert!(is_embeddable(ImageFormat::Jpeg));
		assert!(is_embeddable(ImageFormat::Png));
		assert!(!is_embeddable(ImageFormat::Gif));
		assert!(!is_embeddable(ImageFormat::WebP));
	}

	#[test]
	fn test_png_roundtrip_keeps_dimensions() {
		let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(30, 20, Rgb([1, 2, 3])));
		let bytes = encode_png(&image);
		assert_eq!(decode(&bytes).unwrap().dimensions(), (30, 20));
	}
}
