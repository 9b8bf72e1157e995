//! Listing query parameters: filter, sort and page.
//!
//! # Responsibility
//! - Turn boundary-level strings into validated query values.
//! - Describe one page of results with totals.
//!
//! # Invariants
//! - A constructed `PageRequest` always has `page >= 0` and `size > 0`.
//! - A constructed `Sort` never targets `chart_data`.
//! - Unknown names are errors, never silently ignored.

use crate::model::analysis::{AnalysisField, Classification, ConfidenceLevel};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_PAGE: i64 = 0;
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Malformed filter, sort or page parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    UnknownSortField(String),
    InvalidSortDirection(String),
    UnknownFilterField(String),
    /// A filter field arrived without a value.
    MissingFilterValue(String),
    /// A filter value arrived without a field.
    MissingFilterField(String),
    InvalidFilterValue { field: String, value: String },
    NegativePage(i64),
    NonPositivePageSize(i64),
    /// `page * size` does not fit a storage offset.
    PageOutOfRange { page: i64, size: i64 },
    InvalidDateRange { start_ms: i64, end_ms: i64 },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSortField(name) => write!(f, "unknown sort field `{name}`"),
            Self::InvalidSortDirection(value) => {
                write!(f, "invalid sort direction `{value}`; expected ASC or DESC")
            }
            Self::UnknownFilterField(name) => write!(f, "unknown filter field `{name}`"),
            Self::MissingFilterValue(field) => {
                write!(f, "filter field `{field}` requires a value")
            }
            Self::MissingFilterField(value) => {
                write!(f, "filter value `{value}` requires a filter field")
            }
            Self::InvalidFilterValue { field, value } => {
                write!(f, "invalid value `{value}` for filter `{field}`")
            }
            Self::NegativePage(page) => write!(f, "page index must be >= 0, got {page}"),
            Self::NonPositivePageSize(size) => write!(f, "page size must be > 0, got {size}"),
            Self::PageOutOfRange { page, size } => {
                write!(f, "page {page} with size {size} is out of range")
            }
            Self::InvalidDateRange { start_ms, end_ms } => write!(
                f,
                "date range end ({end_ms}) must be >= start ({start_ms})"
            ),
        }
    }
}

impl Error for QueryError {}

/// Single filter dimension applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnalysisFilter {
    #[default]
    None,
    Classification(Classification),
    ConfidenceLevel(ConfidenceLevel),
    /// `probability >= threshold`.
    MinProbability(f64),
    /// Store-level composite of classification and confidence.
    ClassificationAndConfidence(Classification, ConfidenceLevel),
    /// `created_at` within `[start_ms, end_ms]`.
    CreatedBetween { start_ms: i64, end_ms: i64 },
}

impl AnalysisFilter {
    /// Resolves a boundary filter pair into a single-dimension filter.
    ///
    /// Both parts absent means no filter.
    pub fn parse(field: Option<&str>, value: Option<&str>) -> Result<Self, QueryError> {
        let field = field.map(str::trim).filter(|text| !text.is_empty());
        let value = value.map(str::trim).filter(|text| !text.is_empty());

        let (field, value) = match (field, value) {
            (None, None) => return Ok(Self::None),
            (Some(field), None) => return Err(QueryError::MissingFilterValue(field.to_string())),
            (None, Some(value)) => return Err(QueryError::MissingFilterField(value.to_string())),
            (Some(field), Some(value)) => (field, value),
        };

        let invalid = || QueryError::InvalidFilterValue {
            field: field.to_string(),
            value: value.to_string(),
        };

        match field {
            "classification" => value
                .parse::<Classification>()
                .map(Self::Classification)
                .map_err(|_| invalid()),
            "confidenceLevel" | "confidence_level" => value
                .parse::<ConfidenceLevel>()
                .map(Self::ConfidenceLevel)
                .map_err(|_| invalid()),
            "probability" | "minProbability" | "min_probability" => match value.parse::<f64>() {
                Ok(threshold) if threshold.is_finite() => Ok(Self::MinProbability(threshold)),
                _ => Err(invalid()),
            },
            other => Err(QueryError::UnknownFilterField(other.to_string())),
        }
    }

    /// Builds an inclusive creation-time window filter.
    pub fn created_between(start_ms: i64, end_ms: i64) -> Result<Self, QueryError> {
        if end_ms < start_ms {
            return Err(QueryError::InvalidDateRange { start_ms, end_ms });
        }
        Ok(Self::CreatedBetween { start_ms, end_ms })
    }

    /// Ordering applied when the caller does not name a sort field.
    pub fn default_sort(&self) -> Sort {
        match self {
            Self::None => Sort::new_unchecked(AnalysisField::Id, SortDirection::Desc),
            Self::MinProbability(_) => {
                Sort::new_unchecked(AnalysisField::Probability, SortDirection::Desc)
            }
            Self::Classification(_)
            | Self::ConfidenceLevel(_)
            | Self::ClassificationAndConfidence(..)
            | Self::CreatedBetween { .. } => {
                Sort::new_unchecked(AnalysisField::CreatedAt, SortDirection::Desc)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Result<Self, QueryError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(QueryError::InvalidSortDirection(value.to_string())),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    field: AnalysisField,
    direction: SortDirection,
}

impl Sort {
    pub fn new(field: AnalysisField, direction: SortDirection) -> Result<Self, QueryError> {
        if field == AnalysisField::ChartData {
            return Err(QueryError::UnknownSortField(field.wire_name().to_string()));
        }
        Ok(Self::new_unchecked(field, direction))
    }

    /// Parses a field name in either naming convention and a direction.
    pub fn parse(field: &str, direction: &str) -> Result<Self, QueryError> {
        let parsed = AnalysisField::parse(field)
            .ok_or_else(|| QueryError::UnknownSortField(field.to_string()))?;
        Self::new(parsed, SortDirection::parse(direction)?)
    }

    const fn new_unchecked(field: AnalysisField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn field(&self) -> AnalysisField {
        self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl Default for Sort {
    fn default() -> Self {
        AnalysisFilter::None.default_sort()
    }
}

/// Zero-based page index plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Result<Self, QueryError> {
        if page < 0 {
            return Err(QueryError::NegativePage(page));
        }
        if size <= 0 {
            return Err(QueryError::NonPositivePageSize(size));
        }
        if page.checked_mul(size).is_none() {
            return Err(QueryError::PageOutOfRange { page, size });
        }
        Ok(Self {
            page: page.unsigned_abs(),
            size: size.unsigned_abs(),
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Rows skipped before this page; bounded by `i64::MAX` at construction.
    pub fn offset(&self) -> u64 {
        self.page * self.size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE.unsigned_abs(),
            size: DEFAULT_PAGE_SIZE.unsigned_abs(),
        }
    }
}

/// Complete listing query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalysisQuery {
    pub filter: AnalysisFilter,
    pub sort: Sort,
    pub page: PageRequest,
}

impl AnalysisQuery {
    /// Query with `filter`, its default ordering and the first page.
    pub fn filtered(filter: AnalysisFilter) -> Self {
        Self {
            filter,
            sort: filter.default_sort(),
            page: PageRequest::default(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    /// Builds a query from boundary parameters.
    ///
    /// An absent sort field selects the filter's default ordering; an absent
    /// direction means descending.
    pub fn from_params(
        filter_field: Option<&str>,
        filter_value: Option<&str>,
        sort_field: Option<&str>,
        sort_direction: Option<&str>,
        page: i64,
        size: i64,
    ) -> Result<Self, QueryError> {
        let filter = AnalysisFilter::parse(filter_field, filter_value)?;
        let direction = match sort_direction {
            Some(value) => SortDirection::parse(value)?,
            None => SortDirection::Desc,
        };
        let sort = match sort_field {
            Some(name) => {
                let field = AnalysisField::parse(name)
                    .ok_or_else(|| QueryError::UnknownSortField(name.to_string()))?;
                Sort::new(field, direction)?
            }
            None => Sort::new_unchecked(filter.default_sort().field(), direction),
        };
        Ok(Self {
            filter,
            sort,
            page: PageRequest::new(page, size)?,
        })
    }
}

/// One page of results plus totals for the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisPage<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl<T> AnalysisPage<T> {
    pub fn new(items: Vec<T>, total_elements: u64, page: PageRequest) -> Self {
        Self {
            items,
            total_elements,
            total_pages: total_elements.div_ceil(page.size()),
            page_number: page.page(),
            page_size: page.size(),
        }
    }

    pub fn map<U, F>(self, f: F) -> AnalysisPage<U>
    where
        F: FnMut(T) -> U,
    {
        AnalysisPage {
            items: self.items.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }

    pub fn is_last(&self) -> bool {
        self.page_number + 1 >= self.total_pages
    }
}
