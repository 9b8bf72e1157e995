use exoscope_core::db::open_db_in_memory;
use exoscope_core::{
    AnalysisFilter, AnalysisMetrics, AnalysisQuery, AnalysisRepository, Classification,
    ConfidenceLevel, NewAnalysis, PageRequest, RepoError, Sort, SqliteAnalysisRepository,
};
use rusqlite::params;

#[test]
fn insert_and_get_roundtrip_assigns_identity() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let analysis = new_analysis(95.8, Classification::ConfirmedExoplanet);
    let stored = repo.insert(&analysis).unwrap();

    assert!(stored.id > 0);
    assert!(stored.created_at > 0);
    assert_eq!(stored.metrics, analysis.metrics);
    assert_eq!(stored.chart_data, analysis.chart_data);

    let loaded = repo.get_by_id(stored.id).unwrap().unwrap();
    assert_eq!(loaded, stored);
    assert!(repo.exists(stored.id).unwrap());
}

#[test]
fn get_missing_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteAnalysisRepository::new(&mut conn);

    assert!(repo.get_by_id(42).unwrap().is_none());
    assert!(!repo.exists(42).unwrap());
}

#[test]
fn insert_rejects_out_of_range_metrics_without_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let mut analysis = new_analysis(50.0, Classification::WeakSignal);
    analysis.metrics.recall = Some(1.2);

    let err = repo.insert(&analysis).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn delete_by_id_reports_whether_row_existed() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let stored = repo
        .insert(&new_analysis(80.0, Classification::StrongCandidate))
        .unwrap();

    assert!(repo.delete_by_id(stored.id).unwrap());
    assert!(!repo.delete_by_id(stored.id).unwrap());
    assert!(repo.get_by_id(stored.id).unwrap().is_none());
}

#[test]
fn ids_are_not_reused_after_delete() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let first = repo
        .insert(&new_analysis(10.0, Classification::FalsePositive))
        .unwrap();
    repo.delete_by_id(first.id).unwrap();
    let second = repo
        .insert(&new_analysis(10.0, Classification::FalsePositive))
        .unwrap();

    assert!(second.id > first.id);
}

#[test]
fn delete_by_ids_ignores_unknown_and_duplicate_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let a = repo
        .insert(&new_analysis(90.0, Classification::ConfirmedExoplanet))
        .unwrap();
    let b = repo
        .insert(&new_analysis(60.0, Classification::PotentialCandidate))
        .unwrap();
    let c = repo
        .insert(&new_analysis(5.0, Classification::UnlikelyDetection))
        .unwrap();

    let removed = repo.delete_by_ids(&[a.id, b.id, b.id, 9_999]).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.exists(c.id).unwrap());

    assert_eq!(repo.delete_by_ids(&[]).unwrap(), 0);
}

#[test]
fn delete_all_empties_store_and_is_repeatable() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    for probability in [10.0, 20.0, 30.0] {
        repo.insert(&new_analysis(probability, Classification::WeakCandidate))
            .unwrap();
    }

    assert_eq!(repo.delete_all().unwrap(), 3);
    assert_eq!(repo.count().unwrap(), 0);
    assert_eq!(repo.delete_all().unwrap(), 0);
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn stored_rows_cannot_be_updated() {
    let mut conn = open_db_in_memory().unwrap();
    let id = {
        let mut repo = SqliteAnalysisRepository::new(&mut conn);
        repo.insert(&new_analysis(70.0, Classification::StrongCandidate))
            .unwrap()
            .id
    };

    let err = conn
        .execute(
            "UPDATE exoplanet_analysis SET probability = 1.0 WHERE id = ?1;",
            params![id],
        )
        .unwrap_err();
    assert!(err.to_string().contains("immutable"), "unexpected error: {err}");
}

#[test]
fn list_filters_by_confidence_level() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let mut high = new_analysis(88.0, Classification::StrongCandidate);
    high.metrics.confidence_level = ConfidenceLevel::High;
    let mut low = new_analysis(12.0, Classification::UnlikelyDetection);
    low.metrics.confidence_level = ConfidenceLevel::Low;
    repo.insert(&high).unwrap();
    repo.insert(&low).unwrap();
    repo.insert(&high).unwrap();

    let page = repo
        .list(&AnalysisQuery::filtered(AnalysisFilter::ConfidenceLevel(
            ConfidenceLevel::High,
        )))
        .unwrap();
    assert_eq!(page.total_elements, 2);
    assert!(page
        .items
        .iter()
        .all(|record| record.metrics.confidence_level == ConfidenceLevel::High));
}

#[test]
fn list_breaks_sort_ties_by_id_for_stable_pages() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(
            repo.insert(&new_analysis(50.0, Classification::PotentialCandidate))
                .unwrap()
                .id,
        );
    }

    let sort = Sort::parse("probability", "ASC").unwrap();
    let mut seen = Vec::new();
    for page in 0..3 {
        let query = AnalysisQuery::default()
            .with_sort(sort)
            .with_page(PageRequest::new(page, 2).unwrap());
        let result = repo.list(&query).unwrap();
        assert_eq!(result.items.len(), 2);
        seen.extend(result.items.into_iter().map(|record| record.id));
    }

    assert_eq!(seen, ids);
}

#[test]
fn list_filters_by_classification_and_confidence() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let mut target = new_analysis(93.0, Classification::ConfirmedExoplanet);
    target.metrics.confidence_level = ConfidenceLevel::VeryHigh;
    let mut other_level = new_analysis(91.0, Classification::ConfirmedExoplanet);
    other_level.metrics.confidence_level = ConfidenceLevel::Moderate;
    let target_id = repo.insert(&target).unwrap().id;
    repo.insert(&other_level).unwrap();

    let page = repo
        .list(&AnalysisQuery::filtered(
            AnalysisFilter::ClassificationAndConfidence(
                Classification::ConfirmedExoplanet,
                ConfidenceLevel::VeryHigh,
            ),
        ))
        .unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.items[0].id, target_id);
}

#[test]
fn find_high_confidence_requires_both_thresholds() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    let mut strong = new_analysis(97.0, Classification::ConfirmedExoplanet);
    strong.metrics.accuracy = Some(0.96);
    let mut inaccurate = new_analysis(99.0, Classification::ConfirmedExoplanet);
    inaccurate.metrics.accuracy = Some(0.4);
    let mut unscored = new_analysis(98.0, Classification::StrongCandidate);
    unscored.metrics.accuracy = None;
    let mut weaker = new_analysis(91.0, Classification::StrongCandidate);
    weaker.metrics.accuracy = Some(0.91);

    let strong_id = repo.insert(&strong).unwrap().id;
    repo.insert(&inaccurate).unwrap();
    repo.insert(&unscored).unwrap();
    let weaker_id = repo.insert(&weaker).unwrap().id;

    let found = repo.find_high_confidence(90.0, 0.9).unwrap();
    let ids: Vec<_> = found.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![strong_id, weaker_id]);
}

#[test]
fn count_by_classification_counts_exact_label() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteAnalysisRepository::new(&mut conn);

    repo.insert(&new_analysis(95.0, Classification::ConfirmedExoplanet))
        .unwrap();
    repo.insert(&new_analysis(94.0, Classification::ConfirmedExoplanet))
        .unwrap();
    repo.insert(&new_analysis(40.0, Classification::WeakCandidate))
        .unwrap();

    assert_eq!(
        repo.count_by_classification(Classification::ConfirmedExoplanet)
            .unwrap(),
        2
    );
    assert_eq!(
        repo.count_by_classification(Classification::FalsePositive)
            .unwrap(),
        0
    );
}

#[test]
fn read_rejects_unknown_persisted_label() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO exoplanet_analysis (
            orbital_period, transit_duration, transit_depth, snr, planet_radius,
            probability, classification, confidence_level, created_at
        ) VALUES (1.0, 1.0, 1.0, 1.0, 1.0, 50.0, 'Rogue Planet', 'High', 1);",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();

    let repo = SqliteAnalysisRepository::new(&mut conn);
    let err = repo.get_by_id(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

fn new_analysis(probability: f64, classification: Classification) -> NewAnalysis {
    NewAnalysis {
        metrics: AnalysisMetrics {
            orbital_period: 50.5,
            transit_duration: 8.2,
            transit_depth: 2.5,
            snr: 25.3,
            planet_radius: 4.2,
            probability,
            accuracy: Some(0.95),
            f1_score: Some(0.93),
            precision: Some(0.94),
            recall: Some(0.92),
            false_positive_rate: Some(0.05),
            classification,
            confidence_level: ConfidenceLevel::VeryHigh,
        },
        chart_data: Some(r#"{"lightCurve":[1.0,0.98,1.0]}"#.to_string()),
    }
}
