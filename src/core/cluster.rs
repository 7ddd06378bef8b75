//! Cluster data structures for consensus voting

use serde::Serialize;

/// Group of candidates that are connected under the similarity threshold.
///
/// Members are indices into the candidate list, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
	pub members: Vec<usize>,
	/// Member with the largest pixel area (earliest on ties)
	pub representative: usize,
}

impl Cluster {
	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn contains(&self, index: usize) -> bool {
		self.members.binary_search(&index).is_ok()
	}
}

/// Outcome of a consensus vote
#[derive(Debug, Clone, Serialize)]
pub struct Consensus {
	/// Index of the chosen candidate
	pub winner: usize,
	/// The winning cluster
	pub cluster: Cluster,
	/// Number of clusters found among decodable candidates
	pub cluster_count: usize,
	/// Mean similarity of the winner to its cluster members (1.0 for singletons)
	pub cohesion: f32,
	/// Candidates that fingerprinted successfully and took part in the vote
	pub considered: usize,
}
