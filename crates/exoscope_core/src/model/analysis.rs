//! Exoplanet analysis domain model.
//!
//! # Responsibility
//! - Define the analysis record entity and its write-side shape.
//! - Own the field catalogue shared by validation, sorting and wire mapping.
//! - Own the closed label vocabularies for classification and confidence.
//!
//! # Invariants
//! - `probability` stays within `[0, 100]`.
//! - Optional quality metrics stay within `[0, 1]` when present.
//! - Every numeric field is finite.
//! - Records are append/delete only; nothing here mutates a stored record.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Store-assigned record identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type AnalysisId = i64;

/// Catalogue of analysis record fields.
///
/// Each field has a wire name (`snake_case`) and an internal camel-case
/// name; [`AnalysisField::parse`] accepts either, so boundary mapping is
/// lossless in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisField {
    Id,
    OrbitalPeriod,
    TransitDuration,
    TransitDepth,
    Snr,
    PlanetRadius,
    Probability,
    Accuracy,
    F1Score,
    Precision,
    Recall,
    FalsePositiveRate,
    Classification,
    ConfidenceLevel,
    ChartData,
    CreatedAt,
}

impl AnalysisField {
    pub const ALL: [AnalysisField; 16] = [
        Self::Id,
        Self::OrbitalPeriod,
        Self::TransitDuration,
        Self::TransitDepth,
        Self::Snr,
        Self::PlanetRadius,
        Self::Probability,
        Self::Accuracy,
        Self::F1Score,
        Self::Precision,
        Self::Recall,
        Self::FalsePositiveRate,
        Self::Classification,
        Self::ConfidenceLevel,
        Self::ChartData,
        Self::CreatedAt,
    ];

    /// Name used on the wire and as the storage column name.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::OrbitalPeriod => "orbital_period",
            Self::TransitDuration => "transit_duration",
            Self::TransitDepth => "transit_depth",
            Self::Snr => "snr",
            Self::PlanetRadius => "planet_radius",
            Self::Probability => "probability",
            Self::Accuracy => "accuracy",
            Self::F1Score => "f1_score",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::FalsePositiveRate => "false_positive_rate",
            Self::Classification => "classification",
            Self::ConfidenceLevel => "confidence_level",
            Self::ChartData => "chart_data",
            Self::CreatedAt => "created_at",
        }
    }

    pub fn camel_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::OrbitalPeriod => "orbitalPeriod",
            Self::TransitDuration => "transitDuration",
            Self::TransitDepth => "transitDepth",
            Self::Snr => "snr",
            Self::PlanetRadius => "planetRadius",
            Self::Probability => "probability",
            Self::Accuracy => "accuracy",
            Self::F1Score => "f1Score",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::FalsePositiveRate => "falsePositiveRate",
            Self::Classification => "classification",
            Self::ConfidenceLevel => "confidenceLevel",
            Self::ChartData => "chartData",
            Self::CreatedAt => "createdAt",
        }
    }

    /// Human-readable label used in validation messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::OrbitalPeriod => "Orbital period",
            Self::TransitDuration => "Transit duration",
            Self::TransitDepth => "Transit depth",
            Self::Snr => "SNR",
            Self::PlanetRadius => "Planet radius",
            Self::Probability => "Probability",
            Self::Accuracy => "Accuracy",
            Self::F1Score => "F1 score",
            Self::Precision => "Precision",
            Self::Recall => "Recall",
            Self::FalsePositiveRate => "False positive rate",
            Self::Classification => "Classification",
            Self::ConfidenceLevel => "Confidence level",
            Self::ChartData => "Chart data",
            Self::CreatedAt => "Created at",
        }
    }

    /// Inclusive value bounds enforced for numeric fields, if any.
    pub fn bounds(self) -> Option<(f64, f64)> {
        match self {
            Self::Probability => Some((0.0, 100.0)),
            Self::Accuracy
            | Self::F1Score
            | Self::Precision
            | Self::Recall
            | Self::FalsePositiveRate => Some((0.0, 1.0)),
            _ => None,
        }
    }

    /// Resolves a field from its wire or camel-case name.
    pub fn parse(name: &str) -> Option<Self> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == trimmed || field.camel_name() == trimmed)
    }
}

impl Display for AnalysisField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for AnalysisField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.wire_name())
    }
}

/// Label text that is not part of a closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel {
    pub field: AnalysisField,
    pub text: String,
}

impl Display for UnknownLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown {} `{}`",
            self.field.label().to_ascii_lowercase(),
            self.text
        )
    }
}

impl Error for UnknownLabel {}

/// Categorical verdict attached to an analysis.
///
/// Serialized as its canonical label text (for example `Confirmed Exoplanet`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Classification {
    ConfirmedExoplanet,
    StrongCandidate,
    WeakCandidate,
    WeakSignal,
    PotentialCandidate,
    UnlikelyDetection,
    FalsePositive,
}

impl Classification {
    pub const ALL: [Classification; 7] = [
        Self::ConfirmedExoplanet,
        Self::StrongCandidate,
        Self::WeakCandidate,
        Self::WeakSignal,
        Self::PotentialCandidate,
        Self::UnlikelyDetection,
        Self::FalsePositive,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::ConfirmedExoplanet => "Confirmed Exoplanet",
            Self::StrongCandidate => "Strong Candidate",
            Self::WeakCandidate => "Weak Candidate",
            Self::WeakSignal => "Weak Signal",
            Self::PotentialCandidate => "Potential Candidate",
            Self::UnlikelyDetection => "Unlikely Detection",
            Self::FalsePositive => "False Positive",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Classification {
    type Err = UnknownLabel;

    /// Matches canonical labels case-insensitively after trimming.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                field: AnalysisField::Classification,
                text: trimmed.to_string(),
            })
    }
}

impl TryFrom<String> for Classification {
    type Error = UnknownLabel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Classification> for String {
    fn from(value: Classification) -> Self {
        value.label().to_string()
    }
}

/// Categorical certainty paired with a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Moderate,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 6] = [
        Self::VeryHigh,
        Self::High,
        Self::Moderate,
        Self::Medium,
        Self::Low,
        Self::VeryLow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryHigh => "Very High",
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::VeryLow => "Very Low",
        }
    }
}

impl Display for ConfidenceLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = UnknownLabel;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownLabel {
                field: AnalysisField::ConfidenceLevel,
                text: trimmed.to_string(),
            })
    }
}

impl TryFrom<String> for ConfidenceLevel {
    type Error = UnknownLabel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConfidenceLevel> for String {
    fn from(value: ConfidenceLevel) -> Self {
        value.label().to_string()
    }
}

/// Field -> message map for every violated constraint of one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<AnalysisField, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation; the first message per field wins.
    pub fn insert(&mut self, field: AnalysisField, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: AnalysisField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: AnalysisField) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = AnalysisField> + '_ {
        self.errors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnalysisField, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    /// Returns `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("validation failed")?;
        for (index, (field, message)) in self.errors.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{field}: {message}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

impl Serialize for ValidationErrors {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, message) in &self.errors {
            map.serialize_entry(field.wire_name(), message)?;
        }
        map.end()
    }
}

/// Checks one present numeric value against finiteness and field bounds.
pub(crate) fn check_number(field: AnalysisField, value: f64, errors: &mut ValidationErrors) {
    if !value.is_finite() {
        errors.insert(field, format!("{} must be a finite number", field.label()));
        return;
    }
    if let Some((min, max)) = field.bounds() {
        if value < min || value > max {
            errors.insert(
                field,
                format!("{} must be between {min} and {max}", field.label()),
            );
        }
    }
}

/// Detection metrics and labels of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    /// Days.
    pub orbital_period: f64,
    /// Hours.
    pub transit_duration: f64,
    /// Percent of stellar flux.
    pub transit_depth: f64,
    pub snr: f64,
    /// Earth radii.
    pub planet_radius: f64,
    /// Exoplanet probability in percent, `[0, 100]`.
    pub probability: f64,
    pub accuracy: Option<f64>,
    pub f1_score: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub false_positive_rate: Option<f64>,
    pub classification: Classification,
    pub confidence_level: ConfidenceLevel,
}

impl AnalysisMetrics {
    /// Numeric fields paired with their catalogue entry.
    pub fn numbers(&self) -> [(AnalysisField, Option<f64>); 11] {
        [
            (AnalysisField::OrbitalPeriod, Some(self.orbital_period)),
            (AnalysisField::TransitDuration, Some(self.transit_duration)),
            (AnalysisField::TransitDepth, Some(self.transit_depth)),
            (AnalysisField::Snr, Some(self.snr)),
            (AnalysisField::PlanetRadius, Some(self.planet_radius)),
            (AnalysisField::Probability, Some(self.probability)),
            (AnalysisField::Accuracy, self.accuracy),
            (AnalysisField::F1Score, self.f1_score),
            (AnalysisField::Precision, self.precision),
            (AnalysisField::Recall, self.recall),
            (AnalysisField::FalsePositiveRate, self.false_positive_rate),
        ]
    }

    /// Validates range and finiteness invariants.
    ///
    /// Reports every violated field, not only the first.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (field, value) in self.numbers() {
            if let Some(value) = value {
                check_number(field, value, &mut errors);
            }
        }
        errors.into_result()
    }
}

/// Write-side shape of a record before the store assigns identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub metrics: AnalysisMetrics,
    /// Encoded chart payload, stored verbatim.
    pub chart_data: Option<String>,
}

/// Persisted analysis record.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub metrics: AnalysisMetrics,
    /// Encoded chart payload exactly as stored.
    pub chart_data: Option<String>,
    /// Unix epoch milliseconds, written once at insert.
    pub created_at: i64,
}
