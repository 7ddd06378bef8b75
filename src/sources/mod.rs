//! # Image Sources
//!
//! The capability the retriever fans a query out to, plus two
//! provider-agnostic adapters: a local directory and a URL template.

pub mod directory;
pub mod http;

pub use directory::DirectorySource;
pub use http::HttpSource;

use thiserror::Error;

use crate::core::{Query, RawCandidate};
use crate::processing::image::DecodeError;

#[derive(Debug, Error)]
pub enum SourceError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("HTTP {status} from {url}")]
	Http { status: u16, url: String },

	#[error("request failed: {0}")]
	Transport(String),

	#[error("response larger than {limit} bytes")]
	TooLarge { limit: u64 },

	#[error("malformed image: {0}")]
	Malformed(#[from] DecodeError),
}

/// A provider of artwork candidates.
///
/// `fetch` blocks; the retriever runs it on a worker thread under its own
/// timeout, so implementations must be safe to call concurrently.
pub trait SourceAdapter: Send + Sync {
	/// Stable identifier used in logs and results
	fn id(&self) -> &str;

	/// Zero or more candidates for the query; an empty list is not an error
	fn fetch(&self, query: &Query) -> Result<Vec<RawCandidate>, SourceError>;
}

/// Lower-case words of `text`, punctuation treated as separators
pub(crate) fn words(text: &str) -> Vec<String> {
	text.split(|c: char| !c.is_alphanumeric())
		.filter(|w| !w.is_empty())
		.map(str::to_lowercase)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_words_collapse_punctuation() {
		assert_eq!(words("AC/DC - Back_in  Black!"), vec!["ac", "dc", "back", "in", "black"]);
		assert!(words(" -- ").is_empty());
	}

	#[test]
	fn test_decode_error_is_malformed() {
		let err: SourceError = DecodeError::Empty.into();
		assert!(matches!(err, SourceError::Malformed(_)));
	}
}
