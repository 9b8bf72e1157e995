//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//! - Validate listing parameters before they reach SQL.
//!
//! # Invariants
//! - Repository writes must enforce `AnalysisMetrics::validate()` before
//!   persistence.
//! - Sort columns come from the closed `AnalysisField` catalogue, never from
//!   caller text.

pub mod analysis_repo;
pub mod query;
