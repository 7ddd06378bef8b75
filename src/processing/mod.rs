//! Pure image-processing stages

pub mod cluster;
pub mod fingerprint;
pub mod image;
pub mod normalize;

pub use cluster::ConsensusClusterer;
pub use normalize::{ArtworkNormalizer, Constraints, Issue, NormalizeError};
