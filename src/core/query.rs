//! Artwork lookup query

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
	#[error("artist must not be empty")]
	EmptyArtist,

	#[error("title must not be empty")]
	EmptyTitle,
}

/// Artist + title pair describing the work to find artwork for.
///
/// Text is kept exactly as given (case included); callers normalize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
	artist: String,
	title: String,
}

impl Query {
	pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Result<Self, QueryError> {
		let artist = artist.into();
		let title = title.into();

		if artist.trim().is_empty() {
			return Err(QueryError::EmptyArtist);
		}
		if title.trim().is_empty() {
			return Err(QueryError::EmptyTitle);
		}

		Ok(Self { artist, title })
	}

	pub fn artist(&self) -> &str {
		&self.artist
	}

	pub fn title(&self) -> &str {
		&self.title
	}
}

impl std::fmt::Display for Query {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} - {}", self.artist, self.title)
	}
}
