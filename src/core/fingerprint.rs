//! Color-histogram fingerprints for approximate image comparison

/// Side length of the downsampled grid the histogram is built from
pub const GRID_SIZE: u32 = 8;
pub const BUCKETS_PER_CHANNEL: usize = 8;
pub const CHANNELS: usize = 3;
pub const FINGERPRINT_DIM: usize = BUCKETS_PER_CHANNEL * CHANNELS;

const PIXELS: u32 = GRID_SIZE * GRID_SIZE;

/// Largest Hamming distance two encoded fingerprints can reach: every pixel
/// of every channel moved to another bucket.
pub const MAX_DIFFERING_BITS: u32 = 2 * PIXELS * CHANNELS as u32;

/// Per-channel bucket counts over an 8x8 RGB grid (24 dimensions).
///
/// Buckets are laid out red, green, blue; each channel's counts sum to 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_DIM]);

impl Fingerprint {
	/// Counts above the grid's pixel count are clamped.
	pub fn from_counts(counts: [u8; FINGERPRINT_DIM]) -> Self {
		Self(counts.map(|c| c.min(PIXELS as u8)))
	}

	pub fn counts(&self) -> &[u8; FINGERPRINT_DIM] {
		&self.0
	}

	/// Fixed-width bit encoding: each count `c` becomes a 64-bit thermometer
	/// code with the lowest `c` bits set, so Hamming distance between two
	/// codes equals the difference of their counts.
	pub fn encode(&self) -> [u64; FINGERPRINT_DIM] {
		self.0.map(|c| {
			if u32::from(c) >= u64::BITS {
				u64::MAX
			} else {
				(1u64 << c) - 1
			}
		})
	}

	/// Normalized Hamming similarity in [0.0, 1.0]
	pub fn similarity(&self, other: &Self) -> f32 {
		let differing: u32 = self
			.encode()
			.iter()
			.zip(other.encode().iter())
			.map(|(a, b)| (a ^ b).count_ones())
			.sum();

		(1.0 - differing as f32 / MAX_DIFFERING_BITS as f32).clamp(0.0, 1.0)
	}
}
