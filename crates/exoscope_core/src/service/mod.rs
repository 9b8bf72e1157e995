//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, chart codec and repository calls into use-case
//!   level APIs.
//! - Keep boundary layers decoupled from storage details.

pub mod analysis_service;
