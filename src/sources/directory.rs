//! Local folder of candidate images

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::MAX_DOWNLOAD_BYTES;
use crate::core::media::is_image_file;
use crate::core::{Query, RawCandidate};
use crate::sources::{words, SourceAdapter, SourceError};
use crate::ui;

/// Images under a root directory whose path names the artist and title.
///
/// With [`accept_all`](Self::accept_all) every image is returned, which
/// suits a folder of covers already downloaded for one release.
#[derive(Debug, Clone)]
pub struct DirectorySource {
	id: String,
	root: PathBuf,
	accept_all: bool,
}

fn contains_phrase(haystack: &[String], needle: &[String]) -> bool {
	!needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

impl DirectorySource {
	pub fn new(id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
		Self {
			id: id.into(),
			root: root.into(),
			accept_all: false,
		}
	}

	pub fn accept_all(mut self) -> Self {
		self.accept_all = true;
		self
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn matches(&self, path: &Path, query: &Query) -> bool {
		if self.accept_all {
			return true;
		}
		let relative = path.strip_prefix(&self.root).unwrap_or(path);
		let path_words = words(&relative.to_string_lossy());
		contains_phrase(&path_words, &words(query.artist()))
			&& contains_phrase(&path_words, &words(query.title()))
	}

	fn load(&self, path: &Path) -> Option<RawCandidate> {
		let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
		if size > MAX_DOWNLOAD_BYTES {
			ui::debug(&format!("Skipping {} ({} bytes)", path.display(), size));
			return None;
		}

		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) => {
				ui::debug(&format!("Could not read {}: {}", path.display(), e));
				return None;
			}
		};

		match RawCandidate::from_bytes(self.id.clone(), bytes) {
			Ok(candidate) => Some(candidate),
			Err(e) => {
				ui::debug(&format!("Skipping {}: {}", path.display(), e));
				None
			}
		}
	}
}

impl SourceAdapter for DirectorySource {
	fn id(&self) -> &str {
		&self.id
	}

	fn fetch(&self, query: &Query) -> Result<Vec<RawCandidate>, SourceError> {
		if !fs::metadata(&self.root)?.is_dir() {
			return Err(SourceError::Io(std::io::Error::new(
				std::io::ErrorKind::InvalidInput,
				format!("{} is not a directory", self.root.display()),
			)));
		}

		let candidates: Vec<RawCandidate> = WalkDir::new(&self.root)
			.sort_by_file_name()
			.into_iter()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_type().is_file() && is_image_file(e.path()))
			.filter(|e| self.matches(e.path(), query))
			.filter_map(|e| self.load(e.path()))
			.collect();

		ui::debug(&format!(
			"{} matched {} image(s) in {}",
			self.id,
			candidates.len(),
			self.root.display()
		));
		Ok(candidates)
	}
}
