//! Single-link consensus clustering over fingerprints

use crate::config::DEFAULT_SIMILARITY_THRESHOLD;
use crate::core::{Cluster, Consensus, Fingerprint, RawCandidate};
use crate::processing::fingerprint;
use crate::ui;

/// Disjoint-set forest over candidate indices
struct UnionFind {
	parent: Vec<usize>,
	rank: Vec<u8>,
}

impl UnionFind {
	fn new(len: usize) -> Self {
		Self {
			parent: (0..len).collect(),
			rank: vec![0; len],
		}
	}

	fn find(&mut self, mut x: usize) -> usize {
		let mut root = x;
		while self.parent[root] != root {
			root = self.parent[root];
		}
		while self.parent[x] != root {
			let next = self.parent[x];
			self.parent[x] = root;
			x = next;
		}
		root
	}

	fn union(&mut self, a: usize, b: usize) {
		let (ra, rb) = (self.find(a), self.find(b));
		if ra == rb {
			return;
		}
		match self.rank[ra].cmp(&self.rank[rb]) {
			std::cmp::Ordering::Less => self.parent[ra] = rb,
			std::cmp::Ordering::Greater => self.parent[rb] = ra,
			std::cmp::Ordering::Equal => {
				self.parent[rb] = ra;
				self.rank[ra] += 1;
			}
		}
	}
}

/// Area at `idx`, 0 when `areas` is shorter than the fingerprint list
fn area_at(areas: &[u64], idx: usize) -> u64 {
	areas.get(idx).copied().unwrap_or(0)
}

/// Groups candidates by mutual similarity and votes for the largest group
#[derive(Debug, Clone, Copy)]
pub struct ConsensusClusterer {
	threshold: f32,
}

impl Default for ConsensusClusterer {
	fn default() -> Self {
		Self::new(DEFAULT_SIMILARITY_THRESHOLD)
	}
}

impl ConsensusClusterer {
	pub fn new(threshold: f32) -> Self {
		Self { threshold }
	}

	pub fn threshold(&self) -> f32 {
		self.threshold
	}

	/// Connected components of the `similarity >= threshold` graph.
	///
	/// `None` fingerprints never join a cluster. Clusters come out ordered
	/// by their first member. Missing `areas` entries count as zero.
	pub fn group(&self, fingerprints: &[Option<Fingerprint>], areas: &[u64]) -> Vec<Cluster> {
		let mut sets = UnionFind::new(fingerprints.len());

		for i in 0..fingerprints.len() {
			let Some(a) = &fingerprints[i] else { continue };
			for j in (i + 1)..fingerprints.len() {
				let Some(b) = &fingerprints[j] else { continue };
				let similarity = a.similarity(b);
				if similarity >= self.threshold {
					ui::debug(&format!("Linked {} with {} (similarity: {:.1}%)", j, i, similarity * 100.0));
					sets.union(i, j);
				}
			}
		}

		// Root -> position in `clusters`; walking indices in order keeps
		// members sorted and clusters ordered by first member.
		let mut slot_of_root = vec![usize::MAX; fingerprints.len()];
		let mut clusters: Vec<Cluster> = Vec::new();

		for (idx, fp) in fingerprints.iter().enumerate() {
			if fp.is_none() {
				continue;
			}
			let root = sets.find(idx);
			if slot_of_root[root] == usize::MAX {
				slot_of_root[root] = clusters.len();
				clusters.push(Cluster {
					members: vec![idx],
					representative: idx,
				});
				continue;
			}

			let cluster = &mut clusters[slot_of_root[root]];
			cluster.members.push(idx);
			if area_at(areas, idx) > area_at(areas, cluster.representative) {
				cluster.representative = idx;
			}
		}

		clusters
	}

	/// Pick the winning candidate from pre-computed fingerprints.
	///
	/// Most members wins; ties go to the larger representative area, then to
	/// the cluster whose first member came earliest.
	pub fn select_fingerprinted(
		&self,
		fingerprints: &[Option<Fingerprint>],
		areas: &[u64],
	) -> Option<Consensus> {
		let clusters = self.group(fingerprints, areas);
		let considered = fingerprints.iter().filter(|fp| fp.is_some()).count();

		let mut best: Option<&Cluster> = None;
		for cluster in &clusters {
			let better = match best {
				None => true,
				Some(current) => {
					(cluster.len(), area_at(areas, cluster.representative))
						> (current.len(), area_at(areas, current.representative))
				}
			};
			if better {
				best = Some(cluster);
			}
		}
		let cluster = best?.clone();

		let winner = cluster.representative;
		let winner_fp = fingerprints[winner]?;
		let cohesion = cluster
			.members
			.iter()
			.filter_map(|&idx| fingerprints[idx].as_ref())
			.map(|fp| winner_fp.similarity(fp))
			.sum::<f32>()
			/ cluster.len() as f32;

		Some(Consensus {
			winner,
			cluster,
			cluster_count: clusters.len(),
			cohesion,
			considered,
		})
	}

	/// Fingerprint the candidates and vote; `None` when nothing decodes
	pub fn select(&self, candidates: &[RawCandidate]) -> Option<Consensus> {
		if candidates.is_empty() {
			return None;
		}

		let fingerprints = fingerprint::compute_all(candidates);
		let areas: Vec<u64> = candidates.iter().map(RawCandidate::area).collect();

		let dropped = fingerprints.iter().filter(|fp| fp.is_none()).count();
		if dropped > 0 {
			ui::debug(&format!("{} of {} candidates could not be decoded", dropped, candidates.len()));
		}

		ui::debug(&format!("Clustering {} images by similarity", candidates.len() - dropped));
		let consensus = self.select_fingerprinted(&fingerprints, &areas)?;

		ui::debug(&format!(
			"Largest group has {} similar images out of {} clusters",
			consensus.cluster.len(),
			consensus.cluster_count
		));
		Some(consensus)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core::fingerprint::{BUCKETS_PER_CHANNEL, FINGERPRINT_DIM};
	use crate::testutil::{candidate, palette, solid_candidate, solid_png};

	fn solid_fp(r: usize, g: usize, b: usize) -> Fingerprint {
		let mut counts = [0u8; FINGERPRINT_DIM];
		counts[r] = 64;
		counts[BUCKETS_PER_CHANNEL + g] = 64;
		counts[2 * BUCKETS_PER_CHANNEL + b] = 64;
		Fingerprint::from_counts(counts)
	}

	/// Red channel split `64 - moved` / `moved` across buckets 0 and 1
	fn shifted_fp(moved: u8) -> Fingerprint {
		let mut counts = [0u8; FINGERPRINT_DIM];
		counts[0] = 64 - moved;
		counts[1] = moved;
		counts[BUCKETS_PER_CHANNEL] = 64;
		counts[2 * BUCKETS_PER_CHANNEL] = 64;
		Fingerprint::from_counts(counts)
	}

	#[test]
	fn test_majority_wins() {
		// 4 mutually similar + 6 pairwise dissimilar singletons, cluster in the middle
		let mut candidates = Vec::new();
		for i in 1..4 {
			candidates.push(solid_candidate(&format!("single-{i}"), 600, palette(i)));
		}
		for i in 0..4 {
			candidates.push(solid_candidate(&format!("agree-{i}"), 300 + i * 10, palette(0)));
		}
		for i in 4..7 {
			candidates.push(solid_candidate(&format!("single-{i}"), 900, palette(i)));
		}

		let consensus = ConsensusClusterer::default().select(&candidates).unwrap();
		assert_eq!(consensus.cluster.len(), 4);
		assert_eq!(consensus.cluster_count, 7);
		assert_eq!(consensus.considered, 10);
		assert_eq!(consensus.cluster.members, vec![3, 4, 5, 6]);
		assert!(candidates[consensus.winner].source_id().starts_with("agree-"));
	}

	#[test]
	fn test_representative_is_largest_area() {
		let candidates = vec![
			solid_candidate("small", 200, palette(2)),
			solid_candidate("large", 800, palette(2)),
			solid_candidate("medium", 500, palette(2)),
		];
		let consensus = ConsensusClusterer::default().select(&candidates).unwrap();
		assert_eq!(consensus.winner, 1);
		assert_eq!(consensus.cohesion, 1.0);
	}

	#[test]
	fn test_single_candidate_wins_alone() {
		let candidates = vec![solid_candidate("only", 300, palette(5))];
		let consensus = ConsensusClusterer::default().select(&candidates).unwrap();
		assert_eq!(consensus.winner, 0);
		assert_eq!(consensus.cluster.len(), 1);
		assert_eq!(consensus.cohesion, 1.0);
	}

	#[test]
	fn test_empty_input_has_no_winner() {
		assert!(ConsensusClusterer::default().select(&[]).is_none());
	}

	#[test]
	fn test_undecodable_candidates_never_win() {
		// Header parses but the pixel data is cut off
		let mut truncated = solid_png(2000, 2000, palette(1));
		truncated.truncate(truncated.len() / 2);
		let broken = candidate("broken", truncated);
		assert_eq!(broken.area(), 4_000_000);

		let candidates = vec![broken.clone(), solid_candidate("ok", 150, palette(3))];
		let consensus = ConsensusClusterer::default().select(&candidates).unwrap();
		assert_eq!(consensus.winner, 1);
		assert_eq!(consensus.considered, 1);
		assert!(!consensus.cluster.contains(0));

		assert!(ConsensusClusterer::default().select(&[broken]).is_none());
	}

	#[test]
	fn test_size_tie_broken_by_best_member_area() {
		let fps = vec![Some(solid_fp(0, 0, 0)), Some(solid_fp(7, 7, 7))];
		let areas = vec![100, 400];
		let consensus = ConsensusClusterer::default()
			.select_fingerprinted(&fps, &areas)
			.unwrap();
		assert_eq!(consensus.winner, 1);
	}

	#[test]
	fn test_full_tie_goes_to_earliest_cluster() {
		let fps = vec![
			Some(solid_fp(3, 3, 3)),
			Some(solid_fp(5, 5, 5)),
			Some(solid_fp(3, 3, 3)),
			Some(solid_fp(5, 5, 5)),
		];
		let areas = vec![100, 100, 100, 100];
		let consensus = ConsensusClusterer::default()
			.select_fingerprinted(&fps, &areas)
			.unwrap();
		assert_eq!(consensus.winner, 0);
		assert_eq!(consensus.cluster.members, vec![0, 2]);
	}

	#[test]
	fn test_single_link_chains_through_intermediate() {
		// a~b and b~c at 0.85, but a and c are further apart
		let a = shifted_fp(0);
		let b = shifted_fp(28);
		let c = shifted_fp(56);
		assert!(a.similarity(&b) >= 0.85);
		assert!(b.similarity(&c) >= 0.85);
		assert!(a.similarity(&c) < 0.85);

		let clusters = ConsensusClusterer::default().group(&[Some(a), Some(b), Some(c)], &[1, 1, 1]);
		assert_eq!(clusters.len(), 1);
		assert_eq!(clusters[0].members, vec![0, 1, 2]);
	}

	#[test]
	fn test_threshold_is_a_parameter() {
		let fps = vec![Some(shifted_fp(0)), Some(shifted_fp(28))];
		let areas = vec![1, 1];
		assert_eq!(ConsensusClusterer::new(0.85).group(&fps, &areas).len(), 1);
		assert_eq!(ConsensusClusterer::new(0.99).group(&fps, &areas).len(), 2);
	}

	#[test]
	fn test_group_skips_missing_fingerprints() {
		let fps = vec![None, Some(solid_fp(1, 1, 1)), None, Some(solid_fp(1, 1, 1))];
		let clusters = ConsensusClusterer::default().group(&fps, &[9, 1, 9, 2]);
		assert_eq!(clusters.len(), 1);
		assert_eq!(clusters[0].members, vec![1, 3]);
		assert_eq!(clusters[0].representative, 3);
	}

	#[test]
	fn test_short_areas_slice_counts_as_zero() {
		let fps = vec![Some(solid_fp(2, 2, 2)), Some(solid_fp(2, 2, 2)), Some(solid_fp(6, 6, 6))];
		let clusterer = ConsensusClusterer::default();

		let clusters = clusterer.group(&fps, &[5]);
		assert_eq!(clusters.len(), 2);
		assert_eq!(clusters[0].representative, 0);

		let consensus = clusterer.select_fingerprinted(&fps, &[]).unwrap();
		assert_eq!(consensus.winner, 0);
		assert_eq!(consensus.cluster.members, vec![0, 1]);
	}

	#[test]
	fn test_selection_is_deterministic() {
		let candidates: Vec<RawCandidate> = (0..8)
			.map(|i| solid_candidate(&format!("s{i}"), 120 + (i as u32 % 3) * 40, palette(i % 3)))
			.collect();
		let clusterer = ConsensusClusterer::default();
		let first = clusterer.select(&candidates).unwrap();
		for _ in 0..5 {
			let again = clusterer.select(&candidates).unwrap();
			assert_eq!(again.winner, first.winner);
			assert_eq!(again.cluster, first.cluster);
		}
	}
}
