//! # Resolve Command
//!
//! Build sources from CLI flags, run the engine and report the winner.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;

use crate::cli::ResolveArgs;
use crate::config::EngineConfig;
use crate::core::media::extension_for;
use crate::core::{NormalizedArtwork, Query};
use crate::engine::{NotFound, Resolution, ResolutionEngine, ResolvedArtwork};
use crate::sources::{DirectorySource, HttpSource};
use crate::ui;

#[derive(Debug, Serialize)]
struct ResolveReport {
	artist: String,
	title: String,
	status: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	reason: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	artwork: Option<ArtworkReport>,
	failures: Vec<String>,
	resolved_at: DateTime<Utc>,
	duration_ms: u128,
}

#[derive(Debug, Serialize)]
struct ArtworkReport {
	source: String,
	mime_type: &'static str,
	width: u32,
	height: u32,
	bytes: usize,
	reencoded: bool,
	cluster_size: usize,
	candidate_count: usize,
	cohesion: f32,
	#[serde(skip_serializing_if = "Option::is_none")]
	output: Option<PathBuf>,
}

/// Apply CLI overrides on top of the loaded config
fn effective_config(args: &ResolveArgs) -> Result<EngineConfig> {
	let mut config = EngineConfig::discover().context("Failed to load configuration")?;

	if let Some(threshold) = args.threshold {
		config.similarity_threshold = threshold;
	}
	if let Some(max) = args.max_candidates {
		config.max_candidates = max;
	}
	if let Some(ms) = args.timeout_ms {
		config.adapter_timeout_ms = ms;
	}
	if let Some(kb) = args.max_kb {
		config.max_bytes = kb.saturating_mul(1024);
	}

	config.validate()?;
	Ok(config)
}

/// Host part of a URL template, used as the source id
fn source_id_for_url(template: &str) -> String {
	let without_scheme = template.split_once("://").map_or(template, |(_, rest)| rest);
	let host = without_scheme.split('/').next().unwrap_or_default();
	if host.is_empty() {
		"url".to_string()
	} else {
		host.to_string()
	}
}

fn source_id_for_dir(dir: &Path) -> String {
	let name = dir
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| dir.display().to_string());
	format!("dir:{}", name)
}

fn build_engine(args: &ResolveArgs, config: EngineConfig) -> Result<ResolutionEngine> {
	let timeout = config.adapter_timeout();
	let mut engine = ResolutionEngine::new(config);

	for dir in &args.search_dirs {
		engine = engine.with_source(DirectorySource::new(source_id_for_dir(dir), dir));
	}
	for dir in &args.accept_dirs {
		engine = engine.with_source(DirectorySource::new(source_id_for_dir(dir), dir).accept_all());
	}
	for template in &args.urls {
		if !template.contains("{artist}") && !template.contains("{title}") {
			ui::warn(&format!("URL template has no placeholders: {}", template));
		}
		engine = engine.with_source(HttpSource::with_timeout(source_id_for_url(template), template, timeout));
	}

	if engine.sources().is_empty() {
		bail!("No sources configured (use -s, -a or -u)");
	}
	Ok(engine)
}

/// Path to write to, with an extension matching the final encoding
fn output_path(requested: &Path, artwork: &NormalizedArtwork) -> PathBuf {
	if requested.extension().is_some() {
		requested.to_path_buf()
	} else {
		requested.with_extension(extension_for(artwork.format()))
	}
}

fn save(requested: &Path, artwork: &NormalizedArtwork) -> Result<PathBuf> {
	let path = output_path(requested, artwork);
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent)
			.with_context(|| format!("Failed to create {}", parent.display()))?;
	}
	fs::write(&path, artwork.bytes()).with_context(|| format!("Failed to write {}", path.display()))?;
	Ok(path)
}

fn print_found(resolved: &ResolvedArtwork, saved: Option<&Path>) {
	let artwork = &resolved.artwork;
	ui::success(&format!(
		"Chose artwork from {} ({} of {} candidates agree)",
		resolved.source_id.bright_blue(),
		resolved.cluster_size,
		resolved.candidate_count
	));
	ui::info(&format!(
		"{}x{} {} {} {}",
		artwork.width(),
		artwork.height(),
		artwork.mime_type(),
		format!("{:.1}KB", artwork.byte_size() as f64 / 1024.0).dimmed(),
		format!("cohesion {:.0}%", resolved.cohesion * 100.0).dimmed()
	));
	if artwork.was_reencoded() {
		ui::info("Re-encoded to fit the size budget");
	}
	if let Some(path) = saved {
		ui::success(&format!("Saved {}", ui::path_link(path, 60)));
	}
}

/// Returns whether artwork was found
pub fn run(args: &ResolveArgs) -> Result<bool> {
	let start = Instant::now();
	let query = Query::new(args.artist.as_str(), args.title.as_str())?;
	let config = effective_config(args)?;
	let engine = build_engine(args, config)?;

	ui::info(&format!(
		"Resolving {} from {} source(s)",
		query.to_string().bright_white().bold(),
		engine.sources().len()
	));

	let resolution = engine
		.resolve_blocking(&query)
		.with_context(|| format!("Failed to resolve artwork for {}", query))?;

	let (found, report) = match resolution {
		Resolution::Found(resolved) => {
			let saved = match &args.output {
				Some(requested) => Some(save(requested, &resolved.artwork)?),
				None => None,
			};

			for failure in &resolved.failures {
				ui::debug(&format!("Source skipped: {}", failure));
			}
			if !args.json {
				print_found(&resolved, saved.as_deref());
			}

			let artwork = &resolved.artwork;
			let report = ResolveReport {
				artist: query.artist().to_string(),
				title: query.title().to_string(),
				status: "found",
				reason: None,
				artwork: Some(ArtworkReport {
					source: resolved.source_id.clone(),
					mime_type: artwork.mime_type(),
					width: artwork.width(),
					height: artwork.height(),
					bytes: artwork.byte_size(),
					reencoded: artwork.was_reencoded(),
					cluster_size: resolved.cluster_size,
					candidate_count: resolved.candidate_count,
					cohesion: resolved.cohesion,
					output: saved,
				}),
				failures: resolved.failures.iter().map(|f| f.to_string()).collect(),
				resolved_at: Utc::now(),
				duration_ms: start.elapsed().as_millis(),
			};
			(true, report)
		}
		Resolution::NotFound(reason) => {
			if !args.json {
				let hint = match reason {
					NotFound::NoCandidates => "check the sources or widen the search",
					NotFound::NoDecodableCandidates => "every candidate was corrupt or unsupported",
				};
				ui::warn(&format!("No artwork found: {} ({})", reason, hint));
			}
			let report = ResolveReport {
				artist: query.artist().to_string(),
				title: query.title().to_string(),
				status: "not_found",
				reason: Some(reason.to_string()),
				artwork: None,
				failures: Vec::new(),
				resolved_at: Utc::now(),
				duration_ms: start.elapsed().as_millis(),
			};
			(false, report)
		}
	};

	if args.json {
		println!("{}", serde_json::to_string_pretty(&report)?);
	} else {
		ui::debug(&format!("Finished in {:.2}s", start.elapsed().as_secs_f32()));
	}

	Ok(found)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::solid_png;

	fn args(dir: &Path) -> ResolveArgs {
		ResolveArgs {
			artist: "Air".into(),
			title: "Moon Safari".into(),
			search_dirs: Vec::new(),
			accept_dirs: vec![dir.to_path_buf()],
			urls: Vec::new(),
			output: None,
			threshold: None,
			max_candidates: None,
			timeout_ms: None,
			max_kb: None,
			json: true,
		}
	}

	#[test]
	fn test_source_id_for_url_uses_host() {
		assert_eq!(source_id_for_url("https://covers.example/{artist}.jpg"), "covers.example");
		assert_eq!(source_id_for_url("covers.example:8080/{title}"), "covers.example:8080");
		assert_eq!(source_id_for_url("https:///x"), "url");
	}

	#[test]
	fn test_overrides_apply() {
		let dir = tempfile::tempdir().unwrap();
		let mut a = args(dir.path());
		a.threshold = Some(0.9);
		a.max_kb = Some(200);
		let config = effective_config(&a).unwrap();
		assert_eq!(config.similarity_threshold, 0.9);
		assert_eq!(config.max_bytes, 200 * 1024);
	}

	#[test]
	fn test_requires_a_source() {
		let dir = tempfile::tempdir().unwrap();
		let mut a = args(dir.path());
		a.accept_dirs.clear();
		assert!(build_engine(&a, EngineConfig::default()).is_err());
	}

	#[test]
	fn test_resolves_and_saves_with_extension() {
		let dir = tempfile::tempdir().unwrap();
		let covers = dir.path().join("covers");
		fs::create_dir(&covers).unwrap();
		fs::write(covers.join("a.png"), solid_png(300, 300, [200, 100, 50])).unwrap();
		fs::write(covers.join("b.png"), solid_png(200, 200, [200, 100, 50])).unwrap();

		let mut a = args(&covers);
		a.output = Some(dir.path().join("out/cover"));
		assert!(run(&a).unwrap());

		let saved = dir.path().join("out/cover.png");
		assert!(saved.is_file());
		let image = image::open(&saved).unwrap();
		assert_eq!(image.width(), 300);
	}

	#[test]
	fn test_empty_folder_is_not_found() {
		let dir = tempfile::tempdir().unwrap();
		assert!(!run(&args(dir.path())).unwrap());
	}
}
