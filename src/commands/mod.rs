//! # Command Implementations
//!
//! Each submodule handles one CLI command (resolve, compare, validate).

pub mod compare;
pub mod resolve;
pub mod validate;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::RawCandidate;
use crate::ui;

/// Read a local image as a candidate labelled with its file name
fn load_candidate(path: &Path) -> Result<RawCandidate> {
	let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
	let label = path
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| path.display().to_string());
	RawCandidate::from_bytes(label, bytes).with_context(|| format!("Not a usable image: {}", path.display()))
}

/// Load every path, warning about (and skipping) the unreadable ones
fn load_candidates(paths: &[impl AsRef<Path>]) -> Vec<RawCandidate> {
	paths
		.iter()
		.filter_map(|path| match load_candidate(path.as_ref()) {
			Ok(candidate) => Some(candidate),
			Err(e) => {
				ui::warn(&format!("{:#}", e));
				None
			}
		})
		.collect()
}
