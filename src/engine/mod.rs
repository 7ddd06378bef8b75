//! # Resolution Engine
//!
//! Query → retrieval → consensus → normalization, as one entry point.

pub mod retriever;

pub use retriever::{CandidateRetriever, Retrieval, SoftFailure, SoftFailureKind};

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::core::{NormalizedArtwork, Query};
use crate::processing::{ArtworkNormalizer, ConsensusClusterer, NormalizeError};
use crate::sources::SourceAdapter;
use crate::ui;

/// Pipeline phase, logged as the engine moves through a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Querying,
	Clustering,
	Normalizing,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Querying => "querying",
			Self::Clustering => "clustering",
			Self::Normalizing => "normalizing",
		};
		f.write_str(name)
	}
}

/// Why no artwork was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
	/// Every source failed or came back empty
	NoCandidates,
	/// Candidates arrived but none could be decoded
	NoDecodableCandidates,
}

impl fmt::Display for NotFound {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoCandidates => f.write_str("no source returned a candidate"),
			Self::NoDecodableCandidates => f.write_str("no candidate could be decoded"),
		}
	}
}

#[derive(Debug)]
pub struct ResolvedArtwork {
	pub artwork: NormalizedArtwork,
	pub source_id: String,
	pub cluster_size: usize,
	pub candidate_count: usize,
	/// Mean similarity of the winner to its cluster, 1.0 for a lone candidate
	pub cohesion: f32,
	pub failures: Vec<SoftFailure>,
}

/// Outcome of a query. Absence is an expected result, not an error.
#[derive(Debug)]
pub enum Resolution {
	Found(ResolvedArtwork),
	NotFound(NotFound),
}

impl Resolution {
	pub fn is_found(&self) -> bool {
		matches!(self, Self::Found(_))
	}

	pub fn artwork(&self) -> Option<&NormalizedArtwork> {
		match self {
			Self::Found(resolved) => Some(&resolved.artwork),
			Self::NotFound(_) => None,
		}
	}
}

#[derive(Debug, Error)]
pub enum ResolveError {
	/// A winner exists but cannot meet the output constraints
	#[error("artwork from {source_id} is unusable: {error}")]
	Unusable {
		source_id: String,
		#[source]
		error: NormalizeError,
	},

	#[error("failed to start async runtime: {0}")]
	Runtime(#[from] std::io::Error),
}

fn enter(stage: Stage, query: &Query) {
	ui::debug(&format!("[{}] {}", stage, query));
}

/// Stateless orchestrator over a fixed list of sources
#[derive(Clone, Default)]
pub struct ResolutionEngine {
	config: EngineConfig,
	sources: Vec<Arc<dyn SourceAdapter>>,
}

impl fmt::Debug for ResolutionEngine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let ids: Vec<&str> = self.sources.iter().map(|s| s.id()).collect();
		f.debug_struct("ResolutionEngine")
			.field("config", &self.config)
			.field("sources", &ids)
			.finish()
	}
}

impl ResolutionEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			config,
			sources: Vec::new(),
		}
	}

	pub fn with_source(self, source: impl SourceAdapter + 'static) -> Self {
		self.with_shared_source(Arc::new(source))
	}

	pub fn with_shared_source(mut self, source: Arc<dyn SourceAdapter>) -> Self {
		self.sources.push(source);
		self
	}

	pub fn sources(&self) -> &[Arc<dyn SourceAdapter>] {
		&self.sources
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Find, vote on and normalize artwork for `query`.
	///
	/// Only retrieval suspends; clustering and normalization run inline.
	pub async fn resolve(&self, query: &Query) -> Result<Resolution, ResolveError> {
		enter(Stage::Querying, query);
		let retrieval = CandidateRetriever::from_config(&self.config)
			.retrieve(query, &self.sources)
			.await;
		let Retrieval { candidates, failures } = retrieval;

		if candidates.is_empty() {
			ui::debug(&format!("No candidates ({} source failure(s))", failures.len()));
			return Ok(Resolution::NotFound(NotFound::NoCandidates));
		}

		enter(Stage::Clustering, query);
		let clusterer = ConsensusClusterer::new(self.config.similarity_threshold);
		let Some(consensus) = clusterer.select(&candidates) else {
			return Ok(Resolution::NotFound(NotFound::NoDecodableCandidates));
		};

		enter(Stage::Normalizing, query);
		let winner = &candidates[consensus.winner];
		ui::debug(&format!(
			"Winner {} ({} of {} agree, cohesion {:.2})",
			winner.label(),
			consensus.cluster.len(),
			consensus.considered,
			consensus.cohesion
		));

		let artwork = ArtworkNormalizer::new(self.config.constraints())
			.normalize(winner)
			.map_err(|error| ResolveError::Unusable {
				source_id: winner.source_id().to_string(),
				error,
			})?;

		Ok(Resolution::Found(ResolvedArtwork {
			artwork,
			source_id: winner.source_id().to_string(),
			cluster_size: consensus.cluster.len(),
			candidate_count: candidates.len(),
			cohesion: consensus.cohesion,
			failures,
		}))
	}

	/// [`resolve`](Self::resolve) for synchronous callers.
	///
	/// Uses a private current-thread runtime; adapters still running past
	/// their timeout are left behind instead of joined. Fails with
	/// [`ResolveError::Runtime`] when called from inside a tokio runtime,
	/// where [`resolve`](Self::resolve) should be awaited instead.
	pub fn resolve_blocking(&self, query: &Query) -> Result<Resolution, ResolveError> {
		if tokio::runtime::Handle::try_current().is_ok() {
			return Err(ResolveError::Runtime(std::io::Error::other(
				"resolve_blocking called from within an async runtime",
			)));
		}

		let runtime = tokio::runtime::Builder::new_current_thread()
			.enable_time()
			.build()?;
		let result = runtime.block_on(self.resolve(query));
		runtime.shutdown_background();
		result
	}
}
