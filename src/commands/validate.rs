//! # Validate Command
//!
//! Report every embedding constraint a local image violates.

use std::path::PathBuf;

use anyhow::{bail, Result};
use colored::*;

use crate::config::EngineConfig;
use crate::processing::ArtworkNormalizer;
use crate::ui;

pub fn run(images: &[PathBuf]) -> Result<()> {
	let config = EngineConfig::discover()?;
	let normalizer = ArtworkNormalizer::new(config.constraints());
	let mut failing = 0;

	for path in images {
		let candidate = match super::load_candidate(path) {
			Ok(candidate) => candidate,
			Err(e) => {
				ui::error(&format!("{:#}", e));
				failing += 1;
				continue;
			}
		};

		let summary = format!(
			"{} {}",
			ui::path_link(path, 50),
			format!(
				"{}x{} {:.1}KB",
				candidate.width(),
				candidate.height(),
				candidate.byte_size() as f64 / 1024.0
			)
			.dimmed()
		);

		let issues = normalizer.inspect(&candidate);
		if issues.is_empty() {
			ui::success(&summary);
			continue;
		}

		failing += 1;
		ui::warn(&summary);
		for issue in &issues {
			eprintln!("    {} {}", "-".bright_yellow(), issue);
		}
		match normalizer.normalize(&candidate) {
			Ok(fixed) => ui::info(&format!(
				"  Fixable: re-encodes to {}x{} {} at {:.1}KB",
				fixed.width(),
				fixed.height(),
				fixed.mime_type(),
				fixed.byte_size() as f64 / 1024.0
			)),
			Err(e) => ui::info(&format!("  Not fixable: {}", e)),
		}
	}

	if failing > 0 {
		bail!("{} of {} image(s) need attention", failing, images.len());
	}
	ui::success(&format!("All {} image(s) ready to embed", images.len()));
	Ok(())
}
