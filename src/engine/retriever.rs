//! Concurrent fan-out of a query to every configured source

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::config::EngineConfig;
use crate::core::{Query, RawCandidate};
use crate::sources::{SourceAdapter, SourceError};
use crate::ui;

/// Why a source contributed nothing
#[derive(Debug)]
pub enum SoftFailureKind {
	Failed(SourceError),
	TimedOut(Duration),
	Panicked,
	Empty,
}

/// A source that was absorbed rather than propagated
#[derive(Debug)]
pub struct SoftFailure {
	pub source_id: String,
	pub kind: SoftFailureKind,
}

impl fmt::Display for SoftFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			SoftFailureKind::Failed(e) => write!(f, "{}: {}", self.source_id, e),
			SoftFailureKind::TimedOut(after) => {
				write!(f, "{}: timed out after {}ms", self.source_id, after.as_millis())
			}
			SoftFailureKind::Panicked => write!(f, "{}: adapter panicked", self.source_id),
			SoftFailureKind::Empty => write!(f, "{}: no results", self.source_id),
		}
	}
}

/// Everything one retrieval produced
#[derive(Debug, Default)]
pub struct Retrieval {
	pub candidates: Vec<RawCandidate>,
	pub failures: Vec<SoftFailure>,
}

impl Retrieval {
	pub fn is_empty(&self) -> bool {
		self.candidates.is_empty()
	}
}

type Outcome = Result<Vec<RawCandidate>, SoftFailureKind>;

async fn call_source(source: Arc<dyn SourceAdapter>, query: Query, limit: Duration) -> Outcome {
	let task = tokio::task::spawn_blocking(move || source.fetch(&query));

	match tokio::time::timeout(limit, task).await {
		Err(_) => Err(SoftFailureKind::TimedOut(limit)),
		Ok(Err(_)) => Err(SoftFailureKind::Panicked),
		Ok(Ok(Err(e))) => Err(SoftFailureKind::Failed(e)),
		Ok(Ok(Ok(candidates))) if candidates.is_empty() => Err(SoftFailureKind::Empty),
		Ok(Ok(Ok(candidates))) => Ok(candidates),
	}
}

/// Bounded, timeout-guarded concurrent retrieval.
///
/// Each adapter runs on the blocking pool. A timed-out adapter's thread is
/// abandoned, not joined; its late result is discarded.
#[derive(Debug, Clone, Copy)]
pub struct CandidateRetriever {
	adapter_timeout: Duration,
	max_candidates: usize,
	max_concurrent: usize,
}

impl CandidateRetriever {
	pub fn new(adapter_timeout: Duration, max_candidates: usize, max_concurrent: usize) -> Self {
		Self {
			adapter_timeout,
			max_candidates,
			max_concurrent: max_concurrent.max(1),
		}
	}

	pub fn from_config(config: &EngineConfig) -> Self {
		Self::new(
			config.adapter_timeout(),
			config.max_candidates,
			config.max_concurrent_sources,
		)
	}

	/// Query every source and collect what comes back.
	///
	/// Never fails: per-source problems become [`SoftFailure`]s. Once
	/// `max_candidates` are in hand no further sources are started, but calls
	/// already in flight are drained and kept. Output is ordered by source
	/// position, independent of completion order.
	pub async fn retrieve(&self, query: &Query, sources: &[Arc<dyn SourceAdapter>]) -> Retrieval {
		let mut tasks: JoinSet<(usize, Outcome)> = JoinSet::new();
		let mut results: Vec<Option<Outcome>> = Vec::with_capacity(sources.len());
		results.resize_with(sources.len(), || None);

		let mut next = 0;
		let mut collected = 0;

		loop {
			while next < sources.len()
				&& tasks.len() < self.max_concurrent
				&& collected < self.max_candidates
			{
				let source = Arc::clone(&sources[next]);
				let query = query.clone();
				let limit = self.adapter_timeout;
				let idx = next;
				ui::debug(&format!("Querying {} for {}", source.id(), query));
				tasks.spawn(async move { (idx, call_source(source, query, limit).await) });
				next += 1;
			}

			let Some(joined) = tasks.join_next().await else {
				break;
			};
			match joined {
				Ok((idx, outcome)) => {
					if let Ok(candidates) = &outcome {
						collected += candidates.len();
					}
					results[idx] = Some(outcome);
				}
				// The wrapper task only awaits; it cannot panic on its own
				Err(e) => ui::debug(&format!("Retrieval task aborted: {}", e)),
			}
		}

		if next < sources.len() {
			ui::debug(&format!(
				"Collected {} candidates; skipped {} remaining source(s)",
				collected,
				sources.len() - next
			));
		}

		let mut retrieval = Retrieval::default();
		for (source, outcome) in sources.iter().zip(results) {
			match outcome {
				Some(Ok(candidates)) => {
					ui::debug(&format!("{} returned {} candidate(s)", source.id(), candidates.len()));
					retrieval.candidates.extend(candidates);
				}
				Some(Err(kind)) => {
					let failure = SoftFailure {
						source_id: source.id().to_string(),
						kind,
					};
					ui::debug(&format!("Source failed softly ({})", failure));
					retrieval.failures.push(failure);
				}
				None => {}
			}
		}

		retrieval
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testutil::solid_candidate;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::thread;

	/// Configurable in-memory source
	struct FakeSource {
		id: String,
		count: usize,
		delay: Duration,
		fail: bool,
		panic: bool,
		calls: Arc<AtomicUsize>,
	}

	impl FakeSource {
		fn returning(id: &str, count: usize) -> Self {
			Self {
				id: id.to_string(),
				count,
				delay: Duration::ZERO,
				fail: false,
				panic: false,
				calls: Arc::new(AtomicUsize::new(0)),
			}
		}

		fn delayed(mut self, delay: Duration) -> Self {
			self.delay = delay;
			self
		}

		fn failing(mut self) -> Self {
			self.fail = true;
			self
		}

		fn panicking(mut self) -> Self {
			self.panic = true;
			self
		}

		fn shared(self) -> Arc<dyn SourceAdapter> {
			Arc::new(self)
		}
	}

	impl SourceAdapter for FakeSource {
		fn id(&self) -> &str {
			&self.id
		}

		fn fetch(&self, _query: &Query) -> Result<Vec<RawCandidate>, SourceError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			if !self.delay.is_zero() {
				thread::sleep(self.delay);
			}
			if self.panic {
				panic!("adapter bug");
			}
			if self.fail {
				return Err(SourceError::Transport("connection reset".into()));
			}
			Ok((0..self.count)
				.map(|i| solid_candidate(&self.id, 100 + i as u32, [10, 20, 30]))
				.collect())
		}
	}

	fn query() -> Query {
		Query::new("Artist", "Title").unwrap()
	}

	fn retriever() -> CandidateRetriever {
		CandidateRetriever::new(Duration::from_millis(200), 12, 4)
	}

	#[tokio::test]
	async fn test_failures_are_absorbed() {
		let sources = vec![
			FakeSource::returning("ok-a", 2).shared(),
			FakeSource::returning("broken", 3).failing().shared(),
			FakeSource::returning("empty", 0).shared(),
			FakeSource::returning("ok-b", 1).shared(),
		];

		let retrieval = retriever().retrieve(&query(), &sources).await;
		assert_eq!(retrieval.candidates.len(), 3);
		assert_eq!(retrieval.failures.len(), 2);
		assert!(matches!(retrieval.failures[0].kind, SoftFailureKind::Failed(_)));
		assert!(matches!(retrieval.failures[1].kind, SoftFailureKind::Empty));
		assert_eq!(retrieval.failures[0].source_id, "broken");
	}

	#[tokio::test]
	async fn test_slow_source_times_out() {
		let sources = vec![
			FakeSource::returning("slow", 2).delayed(Duration::from_millis(600)).shared(),
			FakeSource::returning("fast", 1).shared(),
		];

		let retriever = CandidateRetriever::new(Duration::from_millis(50), 12, 4);
		let retrieval = retriever.retrieve(&query(), &sources).await;
		assert_eq!(retrieval.candidates.len(), 1);
		assert_eq!(retrieval.candidates[0].source_id(), "fast");
		assert!(matches!(
			retrieval.failures[0].kind,
			SoftFailureKind::TimedOut(d) if d == Duration::from_millis(50)
		));
	}

	#[tokio::test]
	async fn test_panicking_source_is_contained() {
		let sources = vec![
			FakeSource::returning("bad", 1).panicking().shared(),
			FakeSource::returning("good", 1).shared(),
		];
		let retrieval = retriever().retrieve(&query(), &sources).await;
		assert_eq!(retrieval.candidates.len(), 1);
		assert!(matches!(retrieval.failures[0].kind, SoftFailureKind::Panicked));
	}

	#[tokio::test]
	async fn test_stops_launching_after_cap() {
		let late = FakeSource::returning("late", 5);
		let late_calls = Arc::clone(&late.calls);
		let sources = vec![
			FakeSource::returning("first", 4).shared(),
			FakeSource::returning("second", 4).shared(),
			late.shared(),
		];

		// One call at a time: the cap is reached before the third source starts
		let retriever = CandidateRetriever::new(Duration::from_millis(500), 6, 1);
		let retrieval = retriever.retrieve(&query(), &sources).await;
		assert_eq!(retrieval.candidates.len(), 8);
		assert_eq!(late_calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_order_follows_source_position() {
		let sources = vec![
			FakeSource::returning("a", 1).delayed(Duration::from_millis(80)).shared(),
			FakeSource::returning("b", 1).delayed(Duration::from_millis(10)).shared(),
			FakeSource::returning("c", 1).shared(),
		];
		let retrieval = retriever().retrieve(&query(), &sources).await;
		let ids: Vec<&str> = retrieval.candidates.iter().map(|c| c.source_id()).collect();
		assert_eq!(ids, vec!["a", "b", "c"]);
	}

	#[tokio::test]
	async fn test_no_sources_is_empty() {
		let retrieval = retriever().retrieve(&query(), &[]).await;
		assert!(retrieval.is_empty());
		assert!(retrieval.failures.is_empty());
	}
}
