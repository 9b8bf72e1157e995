//! Domain model for exoplanet analysis records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep chart payloads opaque behind a generic structured value.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `AnalysisId`.
//! - Deletion is a hard delete; there is no tombstone or update state.

pub mod analysis;
pub mod chart;
