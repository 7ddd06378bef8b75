//! In-memory image fixtures for unit tests

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use xxhash_rust::xxh3::xxh3_64;

use crate::core::RawCandidate;
use crate::processing::image::encode_jpeg;

pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
	let mut cursor = Cursor::new(Vec::new());
	image
		.write_to(&mut cursor, ImageFormat::Png)
		.expect("png encoding should succeed");
	cursor.into_inner()
}

pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
	encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb))))
}

pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3], quality: u8) -> Vec<u8> {
	encode_jpeg(&RgbImage::from_pixel(width, height, Rgb(rgb)), quality)
		.expect("jpeg encoding should succeed")
}

/// Deterministic per-pixel noise; incompressible for size tests
pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
	RgbImage::from_fn(width, height, |x, y| {
		let mut key = [0u8; 16];
		key[..8].copy_from_slice(&seed.to_le_bytes());
		key[8..12].copy_from_slice(&x.to_le_bytes());
		key[12..].copy_from_slice(&y.to_le_bytes());
		let h = xxh3_64(&key).to_le_bytes();
		Rgb([h[0], h[1], h[2]])
	})
}

pub fn noise_png(width: u32, height: u32, seed: u64) -> Vec<u8> {
	encode_png(&DynamicImage::ImageRgb8(noise_image(width, height, seed)))
}

/// Colors sitting in the middle of distinct histogram buckets on every channel
pub fn palette(index: usize) -> [u8; 3] {
	let bucket = |shift: usize| (((index + shift) % 8) as u8) * 32 + 16;
	[bucket(0), bucket(3), bucket(5)]
}

pub fn candidate(source: &str, bytes: Vec<u8>) -> RawCandidate {
	RawCandidate::from_bytes(source, bytes).expect("fixture should be a valid image")
}

pub fn solid_candidate(source: &str, size: u32, rgb: [u8; 3]) -> RawCandidate {
	candidate(source, solid_png(size, size, rgb))
}
