//! # portfolio-core
//!
//! Core library for portfolio-cli - client for a personal developer portfolio.
//!
//! This library provides the foundational functionality for:
//! - Fetching the repository list from the portfolio backend, with retries
//! - Search, language filtering and sorting
//! - Pagination
//! - Configuration and the onboarding preference

pub mod backoff;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod paginate;
pub mod preferences;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, FetchError, Result, TransportError};
pub use orchestrator::{ProjectsOrchestrator, RepositoryPage};
pub use types::{RepositoryRecord, SortMode};
