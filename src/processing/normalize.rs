//! Dimension validation and byte-budget compression

use std::fmt;

use image::imageops::{self, FilterType};
use image::ImageFormat;
use thiserror::Error;

use crate::config::{DEFAULT_MAX_ASPECT_RATIO, DEFAULT_MAX_BYTES, DEFAULT_MAX_DIM, DEFAULT_MIN_DIM};
use crate::core::{NormalizedArtwork, RawCandidate};
use crate::processing::image::{
	decode, encode_jpeg, fit_to_max_edge, flatten_onto_white, is_embeddable, DecodeError,
};
use crate::ui;

/// JPEG qualities tried at full resolution, highest first
const QUALITY_LADDER: &[u8] = &[95, 90, 85, 80, 75, 70, 65, 60, 55, 50, 45, 40, 35, 30, 25, 20, 15];

/// Long-edge scales (percent) tried once quality alone is not enough.
/// The last step is the effective floor unless `min_dim` is hit first.
const SCALE_LADDER: &[u32] = &[90, 80, 70, 60, 50, 40];

/// Qualities tried at each reduced scale
const DOWNSCALE_QUALITIES: &[u8] = &[75, 50, 30, 15];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
	pub min_dim: u32,
	pub max_dim: u32,
	pub max_aspect_ratio: f32,
	pub max_bytes: usize,
}

impl Default for Constraints {
	fn default() -> Self {
		Self {
			min_dim: DEFAULT_MIN_DIM,
			max_dim: DEFAULT_MAX_DIM,
			max_aspect_ratio: DEFAULT_MAX_ASPECT_RATIO,
			max_bytes: DEFAULT_MAX_BYTES,
		}
	}
}

#[derive(Debug, Error)]
pub enum NormalizeError {
	#[error("dimensions {width}x{height}px outside allowed range {min}-{max}px")]
	Dimension { width: u32, height: u32, min: u32, max: u32 },

	#[error("aspect ratio {ratio:.2}:1 exceeds {max:.2}:1")]
	AspectRatio { ratio: f32, max: f32 },

	#[error("could not compress under {max_bytes} bytes (smallest attempt: {smallest} bytes)")]
	Compression { max_bytes: usize, smallest: usize },

	#[error(transparent)]
	Decode(#[from] DecodeError),
}

impl NormalizeError {
	/// Dimension and aspect-ratio rejections, as opposed to compression failures
	pub fn is_validation(&self) -> bool {
		matches!(self, Self::Dimension { .. } | Self::AspectRatio { .. })
	}
}

/// Constraint violation reported by [`ArtworkNormalizer::inspect`]
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
	TooSmall { width: u32, height: u32, min: u32 },
	TooLarge { width: u32, height: u32, max: u32 },
	ExtremeAspectRatio { ratio: f32, max: f32 },
	OverBudget { bytes: usize, max: usize },
	NotEmbeddable { format: Option<ImageFormat> },
}

impl fmt::Display for Issue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::TooSmall { width, height, min } => {
				write!(f, "Cover too small ({}x{}px, min {}x{}px)", width, height, min, min)
			}
			Self::TooLarge { width, height, max } => {
				write!(f, "Cover too large ({}x{}px, max {}x{}px)", width, height, max, max)
			}
			Self::ExtremeAspectRatio { ratio, max } => {
				write!(f, "Cover extreme aspect ratio ({:.2}:1, max {:.2}:1)", ratio, max)
			}
			Self::OverBudget { bytes, max } => write!(
				f,
				"Cover too heavy ({:.1}KB, max {:.1}KB)",
				*bytes as f64 / 1024.0,
				*max as f64 / 1024.0
			),
			Self::NotEmbeddable { format: Some(format) } => {
				write!(f, "Cover format {:?} needs re-encoding for tags", format)
			}
			Self::NotEmbeddable { format: None } => write!(f, "Cover format not recognized"),
		}
	}
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
	width.max(height) as f32 / width.min(height).max(1) as f32
}

/// Validates and compresses the winning candidate for embedding
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtworkNormalizer {
	constraints: Constraints,
}

impl ArtworkNormalizer {
	pub fn new(constraints: Constraints) -> Self {
		Self { constraints }
	}

	pub fn constraints(&self) -> &Constraints {
		&self.constraints
	}

	/// Every constraint the candidate violates, without failing
	pub fn inspect(&self, candidate: &RawCandidate) -> Vec<Issue> {
		let c = &self.constraints;
		let (width, height) = (candidate.width(), candidate.height());
		let mut issues = Vec::new();

		if width < c.min_dim || height < c.min_dim {
			issues.push(Issue::TooSmall { width, height, min: c.min_dim });
		}
		if width > c.max_dim || height > c.max_dim {
			issues.push(Issue::TooLarge { width, height, max: c.max_dim });
		}
		let ratio = aspect_ratio(width, height);
		if ratio > c.max_aspect_ratio {
			issues.push(Issue::ExtremeAspectRatio { ratio, max: c.max_aspect_ratio });
		}
		if candidate.byte_size() > c.max_bytes {
			issues.push(Issue::OverBudget { bytes: candidate.byte_size(), max: c.max_bytes });
		}
		if !candidate.format().is_some_and(is_embeddable) {
			issues.push(Issue::NotEmbeddable { format: candidate.format() });
		}

		issues
	}

	/// Reject out-of-range images, then fit the byte budget.
	///
	/// Embeddable images already under budget pass through untouched.
	/// Everything else is re-encoded as JPEG down a fixed quality ladder,
	/// then a downscale ladder ending at 40% of the long edge. A step that
	/// would go below `min_dim` ends the search early.
	pub fn normalize(&self, candidate: &RawCandidate) -> Result<NormalizedArtwork, NormalizeError> {
		let c = &self.constraints;
		let (width, height) = (candidate.width(), candidate.height());

		if width < c.min_dim || height < c.min_dim || width > c.max_dim || height > c.max_dim {
			return Err(NormalizeError::Dimension {
				width,
				height,
				min: c.min_dim,
				max: c.max_dim,
			});
		}

		let ratio = aspect_ratio(width, height);
		if ratio > c.max_aspect_ratio {
			return Err(NormalizeError::AspectRatio { ratio, max: c.max_aspect_ratio });
		}

		if let Some(format) = candidate.format().filter(|f| is_embeddable(*f)) {
			if candidate.byte_size() <= c.max_bytes {
				return Ok(NormalizedArtwork::new(
					candidate.bytes().to_vec(),
					format,
					width,
					height,
					false,
				));
			}
		}

		ui::debug(&format!(
			"Re-encoding {} ({:.0}KB, budget {:.0}KB)",
			candidate.label(),
			candidate.byte_size() as f64 / 1024.0,
			c.max_bytes as f64 / 1024.0
		));
		self.compress(candidate)
	}

	fn compress(&self, candidate: &RawCandidate) -> Result<NormalizedArtwork, NormalizeError> {
		let c = &self.constraints;
		let rgb = flatten_onto_white(&decode(candidate.bytes())?);
		let (width, height) = rgb.dimensions();
		let mut smallest = usize::MAX;

		for &quality in QUALITY_LADDER {
			let encoded = encode_jpeg(&rgb, quality)?;
			smallest = smallest.min(encoded.len());
			if encoded.len() <= c.max_bytes {
				ui::debug(&format!(
					"Compressed to {:.1}KB (quality: {})",
					encoded.len() as f64 / 1024.0,
					quality
				));
				return Ok(NormalizedArtwork::new(encoded, ImageFormat::Jpeg, width, height, true));
			}
		}

		let long_edge = width.max(height);
		for &percent in SCALE_LADDER {
			let target = (u64::from(long_edge) * u64::from(percent) / 100) as u32;
			let (w, h) = fit_to_max_edge(width, height, target);
			if w.min(h) < c.min_dim {
				ui::debug(&format!("Downscale floor reached at {}x{}", w, h));
				break;
			}

			let resized = imageops::resize(&rgb, w, h, FilterType::Lanczos3);
			for &quality in DOWNSCALE_QUALITIES {
				let encoded = encode_jpeg(&resized, quality)?;
				smallest = smallest.min(encoded.len());
				if encoded.len() <= c.max_bytes {
					ui::debug(&format!(
						"Compressed to {}x{} at {:.1}KB (quality: {})",
						w,
						h,
						encoded.len() as f64 / 1024.0,
						quality
					));
					return Ok(NormalizedArtwork::new(encoded, ImageFormat::Jpeg, w, h, true));
				}
			}
		}

		Err(NormalizeError::Compression {
			max_bytes: c.max_bytes,
			smallest,
		})
	}
}
