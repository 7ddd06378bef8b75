//! Fingerprint computation from encoded image bytes

use image::imageops::FilterType;
use image::DynamicImage;
use rayon::prelude::*;

use crate::core::fingerprint::{BUCKETS_PER_CHANNEL, CHANNELS, FINGERPRINT_DIM, GRID_SIZE};
use crate::core::{Fingerprint, RawCandidate};
use crate::processing::image::{decode, DecodeError};
use crate::ui;

const BUCKET_WIDTH: usize = 256 / BUCKETS_PER_CHANNEL;

/// Decode and fingerprint encoded image bytes
pub fn compute(bytes: &[u8]) -> Result<Fingerprint, DecodeError> {
	let image = decode(bytes)?;
	Ok(from_image(&image))
}

/// Downsample to the fixed grid (alpha ignored) and histogram each channel
pub fn from_image(image: &DynamicImage) -> Fingerprint {
	let grid = image
		.resize_exact(GRID_SIZE, GRID_SIZE, FilterType::Lanczos3)
		.to_rgb8();

	let mut counts = [0u8; FINGERPRINT_DIM];
	for pixel in grid.pixels() {
		for channel in 0..CHANNELS {
			let bucket = usize::from(pixel.0[channel]) / BUCKET_WIDTH;
			counts[channel * BUCKETS_PER_CHANNEL + bucket] += 1;
		}
	}

	Fingerprint::from_counts(counts)
}

/// Fingerprint every candidate in parallel, preserving order.
///
/// Candidates that fail to decode map to `None` and are logged.
pub fn compute_all(candidates: &[RawCandidate]) -> Vec<Option<Fingerprint>> {
	candidates
		.par_iter()
		.map(|candidate| match compute(candidate.bytes()) {
			Ok(fp) => Some(fp),
			Err(e) => {
				ui::debug(&format!("Dropping {}: {}", candidate.label(), e));
				None
			}
		})
		.collect()
}
