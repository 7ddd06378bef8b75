//! Engine configuration and constants

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::processing::normalize::Constraints;

static CUSTOM_CONFIG: OnceLock<PathBuf> = OnceLock::new();

pub const CONFIG_ENV_VAR: &str = "COVERVOTE_CONFIG";

// === Consensus ===
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.85;

// === Retrieval ===
pub const DEFAULT_MAX_CANDIDATES: usize = 12;
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_CONCURRENT_SOURCES: usize = 5;
pub const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024; // 20MB

// === Normalization ===
pub const DEFAULT_MIN_DIM: u32 = 100;
pub const DEFAULT_MAX_DIM: u32 = 4000;
pub const DEFAULT_MAX_ASPECT_RATIO: f32 = 1.5;
pub const DEFAULT_MAX_BYTES: usize = 500 * 1024; // 500KB

// === File Extensions ===
pub const IMAGE_EXTENSIONS: &[&str] = &[
	"jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif",
];

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid config {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Invalid value for {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}

/// Tunable parameters for a resolution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	pub similarity_threshold: f32,
	pub max_candidates: usize,
	pub adapter_timeout_ms: u64,
	pub max_concurrent_sources: usize,
	pub min_dim: u32,
	pub max_dim: u32,
	pub max_aspect_ratio: f32,
	pub max_bytes: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
			max_candidates: DEFAULT_MAX_CANDIDATES,
			adapter_timeout_ms: DEFAULT_ADAPTER_TIMEOUT_MS,
			max_concurrent_sources: DEFAULT_MAX_CONCURRENT_SOURCES,
			min_dim: DEFAULT_MIN_DIM,
			max_dim: DEFAULT_MAX_DIM,
			max_aspect_ratio: DEFAULT_MAX_ASPECT_RATIO,
			max_bytes: DEFAULT_MAX_BYTES,
		}
	}
}

impl EngineConfig {
	/// Load a JSON config file; missing fields keep their defaults
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		config.validate()?;
		crate::ui::debug(&format!("Loaded config from {}", path.display()));
		Ok(config)
	}

	/// Load from the discovered config path, or defaults when there is none
	pub fn discover() -> Result<Self, ConfigError> {
		match config_path() {
			Some(path) => Self::load(&path),
			None => Ok(Self::default()),
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(0.0..=1.0).contains(&self.similarity_threshold) {
			return Err(invalid(
				"similarity_threshold",
				format!("must be between 0.0 and 1.0, got {}", self.similarity_threshold),
			));
		}
		if self.max_candidates == 0 {
			return Err(invalid("max_candidates", "must be at least 1".to_string()));
		}
		if self.adapter_timeout_ms == 0 {
			return Err(invalid("adapter_timeout_ms", "must be at least 1".to_string()));
		}
		if self.max_concurrent_sources == 0 {
			return Err(invalid("max_concurrent_sources", "must be at least 1".to_string()));
		}
		if self.min_dim == 0 {
			return Err(invalid("min_dim", "must be at least 1".to_string()));
		}
		if self.min_dim > self.max_dim {
			return Err(invalid(
				"min_dim",
				format!("{} exceeds max_dim {}", self.min_dim, self.max_dim),
			));
		}
		if self.max_aspect_ratio.is_nan() || self.max_aspect_ratio < 1.0 {
			return Err(invalid(
				"max_aspect_ratio",
				format!("must be at least 1.0, got {}", self.max_aspect_ratio),
			));
		}
		if self.max_bytes == 0 {
			return Err(invalid("max_bytes", "must be at least 1".to_string()));
		}
		Ok(())
	}

	pub fn adapter_timeout(&self) -> Duration {
		Duration::from_millis(self.adapter_timeout_ms)
	}

	pub fn constraints(&self) -> Constraints {
		Constraints {
			min_dim: self.min_dim,
			max_dim: self.max_dim,
			max_aspect_ratio: self.max_aspect_ratio,
			max_bytes: self.max_bytes,
		}
	}
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
	ConfigError::Invalid { field, reason }
}

pub fn set_config_path(path: PathBuf) {
	let _ = CUSTOM_CONFIG.set(path);
}

/// Config file location (explicit path, then COVERVOTE_CONFIG env var)
pub fn config_path() -> Option<PathBuf> {
	if let Some(custom) = CUSTOM_CONFIG.get() {
		crate::ui::debug(&format!("Using custom config: {}", custom.display()));
		return Some(custom.clone());
	}

	if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
		let path = PathBuf::from(&env_path);
		if path.is_file() {
			crate::ui::debug(&format!("Using {}: {}", CONFIG_ENV_VAR, env_path));
			return Some(path);
		}
		crate::ui::warn(&format!("{} points to a missing file: {}", CONFIG_ENV_VAR, env_path));
	}

	None
}
