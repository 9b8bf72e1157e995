//! Exoplanet analysis use-case service.
//!
//! # Responsibility
//! - Validate create requests and report every violated field at once.
//! - Map requests to records and records to responses, including chart
//!   payload encode/decode.
//! - Turn repository outcomes into attributable, typed failures.
//!
//! # Invariants
//! - Each operation maps to exactly one repository transaction.
//! - A save never persists a record whose chart payload failed to encode.
//! - A stored chart payload that fails to decode degrades to `None` for that
//!   record only; reads never fail because of it.
//! - No update operation exists.

use crate::model::analysis::{
    check_number, AnalysisField, AnalysisId, AnalysisMetrics, AnalysisRecord, Classification,
    ConfidenceLevel, NewAnalysis, ValidationErrors,
};
use crate::model::chart::{self, ChartDataError, ChartValue};
use crate::repo::analysis_repo::{AnalysisRepository, RepoError};
use crate::repo::query::{AnalysisFilter, AnalysisPage, AnalysisQuery, PageRequest, QueryError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Caller-facing message for failures that must not leak internals.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from analysis service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Input violates one or more field constraints.
    Validation(ValidationErrors),
    /// Referenced record does not exist.
    NotFound(AnalysisId),
    /// Filter, sort or page parameters are malformed.
    InvalidQuery(QueryError),
    /// Chart payload cannot be encoded; fatal to the triggering save only.
    Serialization(ChartDataError),
    /// Storage-level failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Serialization(_) => "serialization_error",
            Self::Repo(_) => "internal_error",
        }
    }

    /// Message safe to hand to an external caller.
    ///
    /// Storage failures collapse into [`UNEXPECTED_ERROR_MESSAGE`].
    pub fn public_message(&self) -> String {
        match self {
            Self::Repo(_) => UNEXPECTED_ERROR_MESSAGE.to_string(),
            Self::Validation(_) => "Validation failed".to_string(),
            other => other.to_string(),
        }
    }

    /// Field errors when this is a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => write!(f, "{errors}"),
            Self::NotFound(id) => write!(f, "Exoplanet analysis not found with id: {id}"),
            Self::InvalidQuery(err) => write!(f, "invalid query: {err}"),
            Self::Serialization(err) => write!(f, "failed to process chart data: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::NotFound(_) => None,
            Self::InvalidQuery(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::InvalidQuery(value)
    }
}

impl From<ChartDataError> for ServiceError {
    fn from(value: ChartDataError) -> Self {
        Self::Serialization(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(errors) => Self::Validation(errors),
            other => Self::Repo(other),
        }
    }
}

/// Create request as received from the boundary.
///
/// Required fields are optional here so that absence reaches validation
/// and is reported alongside every other violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRequest {
    pub orbital_period: Option<f64>,
    pub transit_duration: Option<f64>,
    pub transit_depth: Option<f64>,
    pub snr: Option<f64>,
    pub planet_radius: Option<f64>,
    pub probability: Option<f64>,
    pub accuracy: Option<f64>,
    pub f1_score: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub false_positive_rate: Option<f64>,
    pub classification: Option<String>,
    pub confidence_level: Option<String>,
    pub chart_data: Option<ChartValue>,
}

impl AnalysisRequest {
    /// Validates every field and returns typed metrics.
    ///
    /// # Errors
    /// - Returns all violations in one `ValidationErrors`, keyed by field.
    pub fn validate(&self) -> Result<AnalysisMetrics, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let orbital_period =
            required_number(AnalysisField::OrbitalPeriod, self.orbital_period, &mut errors);
        let transit_duration =
            required_number(AnalysisField::TransitDuration, self.transit_duration, &mut errors);
        let transit_depth =
            required_number(AnalysisField::TransitDepth, self.transit_depth, &mut errors);
        let snr = required_number(AnalysisField::Snr, self.snr, &mut errors);
        let planet_radius =
            required_number(AnalysisField::PlanetRadius, self.planet_radius, &mut errors);
        let probability =
            required_number(AnalysisField::Probability, self.probability, &mut errors);

        for (field, value) in [
            (AnalysisField::Accuracy, self.accuracy),
            (AnalysisField::F1Score, self.f1_score),
            (AnalysisField::Precision, self.precision),
            (AnalysisField::Recall, self.recall),
            (AnalysisField::FalsePositiveRate, self.false_positive_rate),
        ] {
            if let Some(value) = value {
                check_number(field, value, &mut errors);
            }
        }

        let classification = required_label::<Classification>(
            AnalysisField::Classification,
            self.classification.as_deref(),
            &mut errors,
        );
        let confidence_level = required_label::<ConfidenceLevel>(
            AnalysisField::ConfidenceLevel,
            self.confidence_level.as_deref(),
            &mut errors,
        );

        let (
            Some(orbital_period),
            Some(transit_duration),
            Some(transit_depth),
            Some(snr),
            Some(planet_radius),
            Some(probability),
            Some(classification),
            Some(confidence_level),
        ) = (
            orbital_period,
            transit_duration,
            transit_depth,
            snr,
            planet_radius,
            probability,
            classification,
            confidence_level,
        )
        else {
            return Err(errors);
        };
        errors.into_result()?;

        Ok(AnalysisMetrics {
            orbital_period,
            transit_duration,
            transit_depth,
            snr,
            planet_radius,
            probability,
            accuracy: self.accuracy,
            f1_score: self.f1_score,
            precision: self.precision,
            recall: self.recall,
            false_positive_rate: self.false_positive_rate,
            classification,
            confidence_level,
        })
    }
}

/// Record as returned to callers, with chart payload decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub id: AnalysisId,
    #[serde(flatten)]
    pub metrics: AnalysisMetrics,
    pub chart_data: Option<ChartValue>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl From<AnalysisRecord> for AnalysisResponse {
    fn from(record: AnalysisRecord) -> Self {
        let chart_data = record.chart_data.as_deref().and_then(|text| {
            let decoded = chart::decode(text);
            if decoded.is_none() {
                warn!(
                    "event=analysis_chart_dropped module=service status=degraded id={}",
                    record.id
                );
            }
            decoded
        });

        Self {
            id: record.id,
            metrics: record.metrics,
            chart_data,
            created_at: record.created_at,
        }
    }
}

/// Use-case service for exoplanet analysis records.
pub struct AnalysisService<R: AnalysisRepository> {
    repo: R,
}

impl<R: AnalysisRepository> AnalysisService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates, encodes and persists a new analysis.
    ///
    /// # Errors
    /// - `Validation` listing every violated field.
    /// - `Serialization` when chart data cannot be encoded; nothing is written.
    pub fn save(&mut self, request: &AnalysisRequest) -> ServiceResult<AnalysisResponse> {
        info!("event=analysis_save module=service status=start");

        let metrics = match request.validate() {
            Ok(metrics) => metrics,
            Err(errors) => {
                warn!(
                    "event=analysis_save module=service status=rejected error_code=validation_error fields={}",
                    join_fields(&errors)
                );
                return Err(errors.into());
            }
        };

        let chart_data = match request.chart_data.as_ref().map(chart::encode).transpose() {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(
                    "event=analysis_save module=service status=error error_code=serialization_error error={err}"
                );
                return Err(err.into());
            }
        };

        let record = self.repo.insert(&NewAnalysis {
            metrics,
            chart_data,
        })?;
        info!(
            "event=analysis_save module=service status=ok id={} classification={}",
            record.id,
            record.metrics.classification.label()
        );
        Ok(record.into())
    }

    /// Gets one analysis by id.
    ///
    /// # Errors
    /// - `NotFound` when no record has this id.
    pub fn find_by_id(&self, id: AnalysisId) -> ServiceResult<AnalysisResponse> {
        match self.repo.get_by_id(id)? {
            Some(record) => Ok(record.into()),
            None => {
                warn!("event=analysis_get module=service status=not_found id={id}");
                Err(ServiceError::NotFound(id))
            }
        }
    }

    /// Lists analyses with filter, sort and pagination.
    pub fn list(&self, query: &AnalysisQuery) -> ServiceResult<AnalysisPage<AnalysisResponse>> {
        let page = self.repo.list(query)?;
        info!(
            "event=analysis_list module=service status=ok page={} size={} total={}",
            page.page_number, page.page_size, page.total_elements
        );
        Ok(page.map(AnalysisResponse::from))
    }

    /// Lists analyses created within `[start_ms, end_ms]`, newest first.
    pub fn find_created_between(
        &self,
        start_ms: i64,
        end_ms: i64,
        page: PageRequest,
    ) -> ServiceResult<AnalysisPage<AnalysisResponse>> {
        let filter = AnalysisFilter::created_between(start_ms, end_ms)?;
        self.list(&AnalysisQuery::filtered(filter).with_page(page))
    }

    /// Lists analyses matching both labels, newest first.
    pub fn find_by_classification_and_confidence(
        &self,
        classification: Classification,
        confidence_level: ConfidenceLevel,
        page: PageRequest,
    ) -> ServiceResult<AnalysisPage<AnalysisResponse>> {
        let filter = AnalysisFilter::ClassificationAndConfidence(classification, confidence_level);
        self.list(&AnalysisQuery::filtered(filter).with_page(page))
    }

    /// Analyses at or above both thresholds, highest probability first.
    pub fn find_high_confidence(
        &self,
        min_probability: f64,
        min_accuracy: f64,
    ) -> ServiceResult<Vec<AnalysisResponse>> {
        for (field, value) in [
            ("minProbability", min_probability),
            ("minAccuracy", min_accuracy),
        ] {
            if !value.is_finite() {
                return Err(QueryError::InvalidFilterValue {
                    field: field.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        let records = self.repo.find_high_confidence(min_probability, min_accuracy)?;
        Ok(records.into_iter().map(AnalysisResponse::from).collect())
    }

    pub fn count(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }

    pub fn count_by_classification(&self, classification: Classification) -> ServiceResult<u64> {
        Ok(self.repo.count_by_classification(classification)?)
    }

    /// Deletes one analysis.
    ///
    /// # Errors
    /// - `NotFound` when the id does not exist; existence is checked before
    ///   the delete rather than inferred from an empty delete.
    pub fn delete_by_id(&mut self, id: AnalysisId) -> ServiceResult<()> {
        if !self.repo.delete_by_id(id)? {
            warn!("event=analysis_delete module=service status=not_found id={id}");
            return Err(ServiceError::NotFound(id));
        }
        info!("event=analysis_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Deletes every listed analysis that exists.
    ///
    /// Unknown ids are ignored; returns how many records were removed.
    pub fn delete_by_ids(&mut self, ids: &[AnalysisId]) -> ServiceResult<usize> {
        let removed = self.repo.delete_by_ids(ids)?;
        info!(
            "event=analysis_delete_many module=service status=ok requested={} removed={}",
            ids.len(),
            removed
        );
        Ok(removed)
    }

    /// Deletes every analysis. Succeeds on an empty store.
    pub fn delete_all(&mut self) -> ServiceResult<usize> {
        let removed = self.repo.delete_all()?;
        info!("event=analysis_delete_all module=service status=ok removed={removed}");
        Ok(removed)
    }
}

fn required_number(
    field: AnalysisField,
    value: Option<f64>,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let Some(value) = value else {
        errors.insert(field, format!("{} is required", field.label()));
        return None;
    };
    check_number(field, value, errors);
    Some(value)
}

fn required_label<T>(
    field: AnalysisField,
    raw: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    let text = raw.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        errors.insert(field, format!("{} is required", field.label()));
        return None;
    }
    match text.parse::<T>() {
        Ok(label) => Some(label),
        Err(err) => {
            errors.insert(field, err.to_string());
            None
        }
    }
}

fn join_fields(errors: &ValidationErrors) -> String {
    errors
        .fields()
        .map(AnalysisField::wire_name)
        .collect::<Vec<_>>()
        .join(",")
}
