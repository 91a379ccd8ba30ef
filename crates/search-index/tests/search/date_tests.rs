//! Date parameter searches.
//!
//! Ranges match rows fully contained in them: the row's low end must not
//! precede the lower bound and its high end must not follow the upper bound.

use serde_json::json;

use helios_search_index::error::{SearchError, StorageError};
use helios_search_index::types::QueryValue;

use crate::common::{create_engine, observation_at, observation_during};

fn between(lower: Option<&str>, upper: Option<&str>) -> QueryValue {
    QueryValue::date_between(lower, upper).unwrap()
}

#[tokio::test]
async fn test_point_within_range() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    let created = observations
        .create(observation_at("final", "2020-01-01T00:00:00Z"))
        .await
        .unwrap();

    let found = observations
        .search_single("date", between(Some("2019-01-01"), Some("2021-01-01")))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), created.id());

    let later = observations
        .search_single("date", between(Some("2020-06-01"), None))
        .await
        .unwrap();
    assert!(later.is_empty());
}

#[tokio::test]
async fn test_single_sided_bounds() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    observations
        .create(observation_at("final", "2020-01-01T00:00:00Z"))
        .await
        .unwrap();

    let cases = [
        ("ge2019-12-31", 1),
        ("ge2020-01-02", 0),
        ("le2020-01-01", 1),
        ("le2019-12-31", 0),
        ("2020-01-01", 1),
        ("2020", 1),
        ("2019", 0),
    ];
    for (query, expected) in cases {
        let found = observations
            .search_single("date", QueryValue::parse_date(query).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), expected, "{}", query);
    }
}

#[tokio::test]
async fn test_strict_prefixes_exclude_boundary() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    observations
        .create(observation_at("final", "2020-01-01T00:00:00Z"))
        .await
        .unwrap();

    let cases = [
        ("gt2020-01-01T00:00:00Z", 0),
        ("lt2020-01-01T00:00:00Z", 0),
        ("ge2020-01-01T00:00:00Z", 1),
        ("le2020-01-01T00:00:00Z", 1),
        ("gt2019-12-31", 1),
        ("gt2020-01-01", 0),
        ("lt2020-01-02", 1),
        ("lt2020-01-01", 0),
        ("sa2019", 1),
        ("eb2020", 0),
        ("eb2021", 1),
    ];
    for (query, expected) in cases {
        let found = observations
            .search_single("date", QueryValue::parse_date(query).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), expected, "{}", query);
    }
}

#[tokio::test]
async fn test_period_must_fit_inside_range() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    let created = observations
        .create(observation_during(Some("2020-01-01"), Some("2020-03-01")))
        .await
        .unwrap();

    let enclosing = observations
        .search_single("date", between(Some("2019-12-01"), Some("2020-12-31")))
        .await
        .unwrap();
    assert_eq!(enclosing.len(), 1);
    assert_eq!(enclosing[0].id(), created.id());

    // Overlaps the period but does not contain it.
    let overlapping = observations
        .search_single("date", between(Some("2020-02-01"), Some("2020-12-31")))
        .await
        .unwrap();
    assert!(overlapping.is_empty());
}

#[tokio::test]
async fn test_open_ended_period() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    observations
        .create(observation_during(Some("2020-01-01"), None))
        .await
        .unwrap();

    let lower_only = observations
        .search_single("date", between(Some("2019-01-01"), None))
        .await
        .unwrap();
    assert_eq!(lower_only.len(), 1);

    let bounded = observations
        .search_single("date", between(Some("2019-01-01"), Some("2030-01-01")))
        .await
        .unwrap();
    assert!(bounded.is_empty());
}

#[tokio::test]
async fn test_birthdate_day_precision() {
    let engine = create_engine();
    let patients = engine.dao("Patient").unwrap();
    patients
        .create(json!({"resourceType": "Patient", "birthDate": "1980-05-02"}))
        .await
        .unwrap();

    let found = patients
        .search_single("birthdate", QueryValue::parse_date("1980-05-02").unwrap())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_unbounded_date_is_rejected() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();

    let err = observations
        .search_single("date", QueryValue::date_between(None, None).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Search(SearchError::InvalidQueryValue { .. })
    ));
}
