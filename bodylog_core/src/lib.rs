#![forbid(unsafe_code)]

//! Core domain model and business logic for the bodylog workout journal.
//!
//! This crate provides:
//! - Domain types (blocks, workout days, templates, analytics summaries)
//! - Block validation
//! - Record persistence (locked JSON document store)
//! - Rolling analytics over a trailing window of days
//! - Single-identity access control

pub mod types;
pub mod block;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod analytics;
pub mod access;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use block::{Block, BlockKind};
pub use config::{Config, TrackedLifts};
pub use store::{JsonFileStore, RecordStore};
pub use analytics::{compute_analytics, summarize_window, window_bounds};
pub use access::AccessPolicy;
