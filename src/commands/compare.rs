//! # Compare Command
//!
//! Fingerprint local images and show how the consensus vote would go.

use std::path::PathBuf;

use anyhow::{bail, Result};
use colored::*;

use crate::config::EngineConfig;
use crate::core::{Fingerprint, RawCandidate};
use crate::processing::{fingerprint, ConsensusClusterer};
use crate::ui;

/// Pairwise similarity; `None` where either side failed to decode
fn similarity_matrix(fingerprints: &[Option<Fingerprint>]) -> Vec<Vec<Option<f32>>> {
	fingerprints
		.iter()
		.map(|a| {
			fingerprints
				.iter()
				.map(|b| match (a, b) {
					(Some(a), Some(b)) => Some(a.similarity(b)),
					_ => None,
				})
				.collect()
		})
		.collect()
}

fn print_matrix(candidates: &[RawCandidate], matrix: &[Vec<Option<f32>>], threshold: f32) {
	ui::header("Similarity");

	let columns: String = (0..candidates.len()).map(|i| format!("{:>6}", format!("#{}", i))).collect();
	println!("      {}", columns.bright_blue());

	for (i, row) in matrix.iter().enumerate() {
		let cells: Vec<String> = row
			.iter()
			.enumerate()
			.map(|(j, cell)| match cell {
				None => format!("{:>6}", "-").dimmed().to_string(),
				Some(_) if i == j => format!("{:>6}", "·").dimmed().to_string(),
				Some(sim) if *sim >= threshold => format!("{:>5.0}%", sim * 100.0).bright_green().to_string(),
				Some(sim) => format!("{:>5.0}%", sim * 100.0),
			})
			.collect();
		println!(
			"  {} {}  {}",
			format!("{:>3}", format!("#{}", i)).bright_blue(),
			cells.concat(),
			candidates[i].source_id().dimmed()
		);
	}
}

pub fn run(images: &[PathBuf], threshold: Option<f32>) -> Result<()> {
	let threshold = match threshold {
		Some(t) => t,
		None => EngineConfig::discover()?.similarity_threshold,
	};

	let candidates = super::load_candidates(images);
	if candidates.is_empty() {
		bail!("No readable images to compare");
	}

	ui::info(&format!(
		"Comparing {} images at threshold {:.0}%",
		candidates.len(),
		threshold * 100.0
	));

	let fingerprints = fingerprint::compute_all(&candidates);
	let areas: Vec<u64> = candidates.iter().map(RawCandidate::area).collect();

	for (candidate, fp) in candidates.iter().zip(&fingerprints) {
		if fp.is_none() {
			ui::warn(&format!("{} could not be decoded and is excluded", candidate.source_id()));
		}
	}

	print_matrix(&candidates, &similarity_matrix(&fingerprints), threshold);

	let clusterer = ConsensusClusterer::new(threshold);
	let Some(consensus) = clusterer.select_fingerprinted(&fingerprints, &areas) else {
		ui::warn("Nothing decodable to vote on");
		return Ok(());
	};

	ui::header("Clusters");
	for (n, cluster) in clusterer.group(&fingerprints, &areas).iter().enumerate() {
		let names: Vec<String> = cluster
			.members
			.iter()
			.map(|&idx| {
				let name = format!("#{} {}", idx, candidates[idx].source_id());
				if idx == cluster.representative {
					name.bold().to_string()
				} else {
					name
				}
			})
			.collect();
		let marker = if cluster.contains(consensus.winner) { "★".yellow() } else { " ".normal() };
		println!("  {} {} {}", marker, format!("[{}]", n + 1).bright_blue(), names.join(", "));
	}

	let winner = &candidates[consensus.winner];
	println!();
	ui::success(&format!(
		"Winner: {} {}x{} ({} of {} agree, cohesion {:.0}%)",
		winner.source_id().bright_white().bold(),
		winner.width(),
		winner.height(),
		consensus.cluster.len(),
		consensus.considered,
		consensus.cohesion * 100.0
	));

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::{palette, solid_png};
	use std::fs;

	#[test]
	fn test_matrix_is_symmetric_with_unit_diagonal() {
		let fps = vec![
			Some(fingerprint::compute(&solid_png(64, 64, palette(0))).unwrap()),
			None,
			Some(fingerprint::compute(&solid_png(64, 64, palette(3))).unwrap()),
		];
		let matrix = similarity_matrix(&fps);
		assert_eq!(matrix[0][0], Some(1.0));
		assert_eq!(matrix[0][2], matrix[2][0]);
		assert_eq!(matrix[1][0], None);
		assert_eq!(matrix[2][1], None);
	}

	#[test]
	fn test_run_on_local_files() {
		let dir = tempfile::tempdir().unwrap();
		let a = dir.path().join("a.png");
		let b = dir.path().join("b.png");
		let junk = dir.path().join("junk.jpg");
		fs::write(&a, solid_png(120, 120, palette(1))).unwrap();
		fs::write(&b, solid_png(160, 160, palette(1))).unwrap();
		fs::write(&junk, b"nope").unwrap();

		assert!(run(&[a, b, junk], Some(0.85)).is_ok());
	}

	#[test]
	fn test_run_without_images_fails() {
		let dir = tempfile::tempdir().unwrap();
		assert!(run(&[dir.path().join("missing.png")], Some(0.85)).is_err());
	}
}
