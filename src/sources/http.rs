//! URL-template image source over HTTP

use std::io::Read;
use std::time::Duration;

use crate::config::{DEFAULT_ADAPTER_TIMEOUT_MS, MAX_DOWNLOAD_BYTES};
use crate::core::{Query, RawCandidate};
use crate::processing::image::sniff_format;
use crate::sources::{SourceAdapter, SourceError};
use crate::ui;

const USER_AGENT: &str = concat!("covervote/", env!("CARGO_PKG_VERSION"));

/// Fetches a single image from a URL built by substituting `{artist}` and
/// `{title}` (percent-encoded) into a template.
#[derive(Debug, Clone)]
pub struct HttpSource {
	id: String,
	template: String,
	agent: ureq::Agent,
}

impl HttpSource {
	pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
		Self::with_timeout(id, template, Duration::from_millis(DEFAULT_ADAPTER_TIMEOUT_MS))
	}

	pub fn with_timeout(id: impl Into<String>, template: impl Into<String>, timeout: Duration) -> Self {
		let agent = ureq::AgentBuilder::new()
			.timeout(timeout)
			.user_agent(USER_AGENT)
			.build();

		Self {
			id: id.into(),
			template: template.into(),
			agent,
		}
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	pub fn url_for(&self, query: &Query) -> String {
		self.template
			.replace("{artist}", &urlencoding::encode(query.artist()))
			.replace("{title}", &urlencoding::encode(query.title()))
	}
}

impl SourceAdapter for HttpSource {
	fn id(&self) -> &str {
		&self.id
	}

	fn fetch(&self, query: &Query) -> Result<Vec<RawCandidate>, SourceError> {
		let url = self.url_for(query);
		ui::debug(&format!("{} GET {}", self.id, url));

		let response = match self.agent.get(&url).set("Accept", "image/*").call() {
			Ok(response) => response,
			Err(ureq::Error::Status(404, _)) => return Ok(Vec::new()),
			Err(ureq::Error::Status(status, _)) => return Err(SourceError::Http { status, url }),
			Err(ureq::Error::Transport(transport)) => {
				return Err(SourceError::Transport(transport.to_string()))
			}
		};

		let content_type = response
			.header("Content-Type")
			.unwrap_or_default()
			.to_ascii_lowercase();

		let mut bytes = Vec::new();
		response
			.into_reader()
			.take(MAX_DOWNLOAD_BYTES + 1)
			.read_to_end(&mut bytes)?;
		if bytes.len() as u64 > MAX_DOWNLOAD_BYTES {
			return Err(SourceError::TooLarge { limit: MAX_DOWNLOAD_BYTES });
		}

		if !content_type.starts_with("image/") && sniff_format(&bytes).is_none() {
			ui::debug(&format!("{} returned {} instead of an image", self.id, content_type));
			return Ok(Vec::new());
		}

		Ok(vec![RawCandidate::from_bytes(self.id.clone(), bytes)?])
	}
}
