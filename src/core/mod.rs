//! Core domain types

pub mod artwork;
pub mod candidate;
pub mod cluster;
pub mod fingerprint;
pub mod hash;
pub mod media;
pub mod query;

pub use artwork::NormalizedArtwork;
pub use candidate::RawCandidate;
pub use cluster::{Cluster, Consensus};
pub use fingerprint::Fingerprint;
pub use hash::ContentHash;
pub use query::{Query, QueryError};
