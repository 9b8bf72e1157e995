//! Core domain logic for exoplanet analysis records.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::analysis::{
    AnalysisField, AnalysisId, AnalysisMetrics, AnalysisRecord, Classification, ConfidenceLevel,
    NewAnalysis, UnknownLabel, ValidationErrors,
};
pub use model::chart::{ChartDataError, ChartValue};
pub use repo::analysis_repo::{AnalysisRepository, RepoError, RepoResult, SqliteAnalysisRepository};
pub use repo::query::{
    AnalysisFilter, AnalysisPage, AnalysisQuery, PageRequest, QueryError, Sort, SortDirection,
};
pub use service::analysis_service::{
    AnalysisRequest, AnalysisResponse, AnalysisService, ServiceError, ServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
