//! Analysis repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/read/delete/list APIs over `exoplanet_analysis` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate metrics before SQL mutations.
//! - Every write runs in exactly one IMMEDIATE transaction; dropping the
//!   guard on an error path rolls it back.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Chart payload text is stored and returned verbatim, never parsed here.

use crate::db::DbError;
use crate::model::analysis::{
    AnalysisField, AnalysisId, AnalysisMetrics, AnalysisRecord, Classification,
    ConfidenceLevel, NewAnalysis, ValidationErrors,
};
use crate::repo::query::{AnalysisFilter, AnalysisPage, AnalysisQuery};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

const ANALYSIS_SELECT_SQL: &str = "SELECT
    id,
    orbital_period,
    transit_duration,
    transit_depth,
    snr,
    planet_radius,
    probability,
    accuracy,
    f1_score,
    precision,
    recall,
    false_positive_rate,
    classification,
    confidence_level,
    chart_data,
    created_at
FROM exoplanet_analysis";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for analysis persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationErrors),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted analysis data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for analysis records.
///
/// Records are append/delete only; there is no update operation.
pub trait AnalysisRepository {
    /// Persists a record, assigning `id` and `created_at`.
    fn insert(&mut self, analysis: &NewAnalysis) -> RepoResult<AnalysisRecord>;
    fn get_by_id(&self, id: AnalysisId) -> RepoResult<Option<AnalysisRecord>>;
    fn exists(&self, id: AnalysisId) -> RepoResult<bool>;
    /// Returns `true` iff a row existed and was removed.
    fn delete_by_id(&mut self, id: AnalysisId) -> RepoResult<bool>;
    /// Removes every listed id that exists; unknown ids are ignored.
    ///
    /// Returns the number of removed rows.
    fn delete_by_ids(&mut self, ids: &[AnalysisId]) -> RepoResult<usize>;
    /// Removes every row and returns how many were removed.
    fn delete_all(&mut self) -> RepoResult<usize>;
    fn count(&self) -> RepoResult<u64>;
    fn count_by_classification(&self, classification: Classification) -> RepoResult<u64>;
    /// Filtered, sorted, paginated listing.
    fn list(&self, query: &AnalysisQuery) -> RepoResult<AnalysisPage<AnalysisRecord>>;
    /// Records with `probability >= min_probability` and
    /// `accuracy >= min_accuracy`, highest probability first.
    fn find_high_confidence(
        &self,
        min_probability: f64,
        min_accuracy: f64,
    ) -> RepoResult<Vec<AnalysisRecord>>;
}

/// SQLite-backed analysis repository.
pub struct SqliteAnalysisRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAnalysisRepository<'conn> {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl AnalysisRepository for SqliteAnalysisRepository<'_> {
    fn insert(&mut self, analysis: &NewAnalysis) -> RepoResult<AnalysisRecord> {
        analysis.metrics.validate()?;

        let metrics = &analysis.metrics;
        let created_at = now_epoch_ms();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO exoplanet_analysis (
                orbital_period,
                transit_duration,
                transit_depth,
                snr,
                planet_radius,
                probability,
                accuracy,
                f1_score,
                precision,
                recall,
                false_positive_rate,
                classification,
                confidence_level,
                chart_data,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
            params![
                metrics.orbital_period,
                metrics.transit_duration,
                metrics.transit_depth,
                metrics.snr,
                metrics.planet_radius,
                metrics.probability,
                metrics.accuracy,
                metrics.f1_score,
                metrics.precision,
                metrics.recall,
                metrics.false_positive_rate,
                metrics.classification.label(),
                metrics.confidence_level.label(),
                analysis.chart_data.as_deref(),
                created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        let stored = load_by_id(&tx, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted analysis {id} is not readable"))
        })?;

        tx.commit()?;
        Ok(stored)
    }

    fn get_by_id(&self, id: AnalysisId) -> RepoResult<Option<AnalysisRecord>> {
        load_by_id(self.conn, id)
    }

    fn exists(&self, id: AnalysisId) -> RepoResult<bool> {
        row_exists(self.conn, id)
    }

    fn delete_by_id(&mut self, id: AnalysisId) -> RepoResult<bool> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !row_exists(&tx, id)? {
            return Ok(false);
        }

        tx.execute("DELETE FROM exoplanet_analysis WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(true)
    }

    fn delete_by_ids(&mut self, ids: &[AnalysisId]) -> RepoResult<usize> {
        let unique: BTreeSet<AnalysisId> = ids.iter().copied().collect();
        if unique.is_empty() {
            return Ok(0);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = 0;
        {
            let mut stmt = tx.prepare("DELETE FROM exoplanet_analysis WHERE id = ?1;")?;
            for id in unique {
                removed += stmt.execute([id])?;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    fn delete_all(&mut self) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM exoplanet_analysis;", [])?;
        tx.commit()?;
        Ok(removed)
    }

    fn count(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM exoplanet_analysis;", [], |row| row.get(0))?;
        to_count(total)
    }

    fn count_by_classification(&self, classification: Classification) -> RepoResult<u64> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM exoplanet_analysis WHERE classification = ?1;",
            [classification.label()],
            |row| row.get(0),
        )?;
        to_count(total)
    }

    fn list(&self, query: &AnalysisQuery) -> RepoResult<AnalysisPage<AnalysisRecord>> {
        let (where_sql, filter_values) = filter_clause(&query.filter);
        let sort_column = query.sort.field().wire_name();
        let direction = query.sort.direction().as_sql();

        let mut sql =
            format!("{ANALYSIS_SELECT_SQL}{where_sql} ORDER BY {sort_column} {direction}");
        if query.sort.field() != AnalysisField::Id {
            // Tie-break on id so equal sort keys paginate deterministically.
            sql.push_str(&format!(", id {direction}"));
        }
        sql.push_str(" LIMIT ? OFFSET ?;");

        let mut page_values = filter_values.clone();
        page_values.push(Value::Integer(to_sql_int(query.page.size())?));
        page_values.push(Value::Integer(to_sql_int(query.page.offset())?));

        // Page and total agree only because both run in this one read
        // transaction. File stores are in WAL mode, so it does not block
        // writers; in-memory stores have a single connection.
        let tx = self.conn.unchecked_transaction()?;
        let total: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM exoplanet_analysis{where_sql};"),
            params_from_iter(filter_values.iter()),
            |row| row.get(0),
        )?;

        let mut items = Vec::new();
        {
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(page_values.iter()))?;
            while let Some(row) = rows.next()? {
                items.push(parse_analysis_row(row)?);
            }
        }
        tx.commit()?;

        Ok(AnalysisPage::new(items, to_count(total)?, query.page))
    }

    fn find_high_confidence(
        &self,
        min_probability: f64,
        min_accuracy: f64,
    ) -> RepoResult<Vec<AnalysisRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ANALYSIS_SELECT_SQL}
             WHERE probability >= ?1
               AND accuracy >= ?2
             ORDER BY probability DESC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![min_probability, min_accuracy])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_analysis_row(row)?);
        }
        Ok(records)
    }
}

fn load_by_id(conn: &Connection, id: AnalysisId) -> RepoResult<Option<AnalysisRecord>> {
    let mut stmt = conn.prepare(&format!("{ANALYSIS_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_analysis_row(row)?));
    }
    Ok(None)
}

fn row_exists(conn: &Connection, id: AnalysisId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM exoplanet_analysis WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn filter_clause(filter: &AnalysisFilter) -> (String, Vec<Value>) {
    match filter {
        AnalysisFilter::None => (String::new(), Vec::new()),
        AnalysisFilter::Classification(classification) => (
            " WHERE classification = ?".to_string(),
            vec![Value::Text(classification.label().to_string())],
        ),
        AnalysisFilter::ConfidenceLevel(level) => (
            " WHERE confidence_level = ?".to_string(),
            vec![Value::Text(level.label().to_string())],
        ),
        AnalysisFilter::MinProbability(threshold) => (
            " WHERE probability >= ?".to_string(),
            vec![Value::Real(*threshold)],
        ),
        AnalysisFilter::ClassificationAndConfidence(classification, level) => (
            " WHERE classification = ? AND confidence_level = ?".to_string(),
            vec![
                Value::Text(classification.label().to_string()),
                Value::Text(level.label().to_string()),
            ],
        ),
        AnalysisFilter::CreatedBetween { start_ms, end_ms } => (
            " WHERE created_at BETWEEN ? AND ?".to_string(),
            vec![Value::Integer(*start_ms), Value::Integer(*end_ms)],
        ),
    }
}

fn parse_analysis_row(row: &Row<'_>) -> RepoResult<AnalysisRecord> {
    let id: AnalysisId = row.get("id")?;

    let classification_text: String = row.get("classification")?;
    let classification = classification_text.parse::<Classification>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid classification `{classification_text}` in exoplanet_analysis.classification (id {id})"
        ))
    })?;

    let level_text: String = row.get("confidence_level")?;
    let confidence_level = level_text.parse::<ConfidenceLevel>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid confidence level `{level_text}` in exoplanet_analysis.confidence_level (id {id})"
        ))
    })?;

    let metrics = AnalysisMetrics {
        orbital_period: row.get("orbital_period")?,
        transit_duration: row.get("transit_duration")?,
        transit_depth: row.get("transit_depth")?,
        snr: row.get("snr")?,
        planet_radius: row.get("planet_radius")?,
        probability: row.get("probability")?,
        accuracy: row.get("accuracy")?,
        f1_score: row.get("f1_score")?,
        precision: row.get("precision")?,
        recall: row.get("recall")?,
        false_positive_rate: row.get("false_positive_rate")?,
        classification,
        confidence_level,
    };
    metrics
        .validate()
        .map_err(|errors| RepoError::InvalidData(format!("analysis {id}: {errors}")))?;

    Ok(AnalysisRecord {
        id,
        metrics,
        chart_data: row.get("chart_data")?,
        created_at: row.get("created_at")?,
    })
}

fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative row count {value}")))
}

fn to_sql_int(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value {value} exceeds SQLite integer range")))
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
