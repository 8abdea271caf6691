#![forbid(unsafe_code)]

//! Core domain model and business logic for the Natal triage system.
//!
//! This crate provides:
//! - Domain types (symptom reports, recommendations, contractions)
//! - Clinical rule catalog
//! - Triage assessment engine
//! - Contraction pattern analysis
//! - Persistence (WAL, CSV, session state)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod state;
pub mod contraction;
pub mod history;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, TriageCatalog};
pub use config::Config;
pub use wal::{AssessmentSink, JsonlSink};
pub use contraction::ContractionSession;
pub use history::{load_recent_records, mark_resolved};
pub use engine::assess;
