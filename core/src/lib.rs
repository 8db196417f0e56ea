//! Ludex Core - incremental search client for the game catalog API
//!
//! This crate provides:
//! - Shared types (search fields, result envelopes, statistics)
//! - A TTL cache keyed by query text
//! - The incremental search controller (debounce, cancellation, caching)
//! - An HTTP backend for the catalog API
//! - Configuration loading and result link rules

pub mod backend;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod links;
pub mod policy;
pub mod render;
pub mod sweeper;
pub mod token;
pub mod types;

pub use backend::{Catalog, HttpBackend, SearchBackend};
pub use cache::{CacheEntry, SearchCache};
pub use config::Config;
pub use controller::{normalize_query, ControllerOptions, SearchController, SubmitOutcome};
pub use error::{Error, Result};
pub use links::{language_name, result_link, ResultLink};
pub use policy::{AnalyticVocabulary, CacheExemption};
pub use render::Renderer;
pub use sweeper::spawn_sweeper;
pub use token::CancelToken;
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::backend::{Catalog, HttpBackend, SearchBackend};
    pub use crate::controller::{SearchController, SubmitOutcome};
    pub use crate::error::Error;
    pub use crate::render::Renderer;
    pub use crate::token::CancelToken;
    pub use crate::types::*;
}
