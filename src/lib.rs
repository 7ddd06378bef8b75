//! # covervote
//!
//! Consensus-based album artwork resolution: fan a query out to several
//! unreliable image sources, cluster the results by color-histogram
//! similarity, keep the biggest group's best image and fit it to an
//! embedding budget.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod engine;
pub mod processing;
pub mod sources;
pub mod ui;

#[cfg(test)]
mod testutil;

pub use crate::config::EngineConfig;
pub use crate::core::{NormalizedArtwork, Query, RawCandidate};
pub use crate::engine::{NotFound, Resolution, ResolutionEngine, ResolveError, ResolvedArtwork};
pub use crate::sources::{SourceAdapter, SourceError};
