//! Number and quantity parameter searches.

use rust_decimal::Decimal;

use helios_search_index::error::{SchemaError, StorageError};
use helios_search_index::types::{IndexValue, QueryValue, SearchPrefix};

use crate::common::{create_engine, observation_quantity};

#[tokio::test]
async fn test_ge_and_gt_at_boundary() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    let created = observations
        .create(observation_quantity(5.0, "mg"))
        .await
        .unwrap();

    let ge = observations
        .search_single("value-quantity", QueryValue::parse_number("ge5").unwrap())
        .await
        .unwrap();
    assert_eq!(ge.len(), 1);
    assert_eq!(ge[0].id(), created.id());

    let gt = observations
        .search_single("value-quantity", QueryValue::parse_number("gt5").unwrap())
        .await
        .unwrap();
    assert!(gt.is_empty());
}

#[tokio::test]
async fn test_comparators() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    for value in [1.5, 5.0, 9.25] {
        observations
            .create(observation_quantity(value, "mg"))
            .await
            .unwrap();
    }

    let cases = [
        ("5", 1),
        ("eq5.0", 1),
        ("lt5", 1),
        ("le5", 2),
        ("gt1.5", 2),
        ("ge1.5", 3),
        ("9.25", 1),
        ("10", 0),
    ];
    for (query, expected) in cases {
        let found = observations
            .search_single("value-quantity", QueryValue::parse_number(query).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), expected, "{}", query);
    }
}

#[tokio::test]
async fn test_comparison_keeps_decimal_precision() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    let body: serde_json::Value = serde_json::from_str(
        r#"{
            "resourceType": "Observation",
            "status": "final",
            "valueQuantity": {"value": 1.0000000000000001, "unit": "mg"}
        }"#,
    )
    .unwrap();
    let created = observations.create(body).await.unwrap();

    let rows = observations.index_rows(created.id()).await.unwrap();
    let stored = rows
        .iter()
        .find_map(|r| match &r.entry.value {
            IndexValue::Number { value, .. } => Some(value.to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(stored, "1.0000000000000001");

    let cases = [
        ("eq1.0000000000000001", 1),
        ("eq1.00000000000000010", 1),
        ("eq1.00000000000000001", 0),
        ("eq1", 0),
        ("gt1", 1),
        ("lt1.00000000000000011", 1),
        ("gt1.0000000000000001", 0),
    ];
    for (query, expected) in cases {
        let found = observations
            .search_single("value-quantity", QueryValue::parse_number(query).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), expected, "{}", query);
    }
}

#[tokio::test]
async fn test_negative_values_order_below_zero() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    for value in [-2.5, -0.25, 0.0, 3.0] {
        observations
            .create(observation_quantity(value, "Cel"))
            .await
            .unwrap();
    }

    let cases = [("lt0", 2), ("ge-0.25", 3), ("gt-2.5", 3), ("le-2.5", 1), ("eq0", 1)];
    for (query, expected) in cases {
        let found = observations
            .search_single("value-quantity", QueryValue::parse_number(query).unwrap())
            .await
            .unwrap();
        assert_eq!(found.len(), expected, "{}", query);
    }
}

#[tokio::test]
async fn test_units_constrain_match() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    observations
        .create(observation_quantity(5.0, "mg"))
        .await
        .unwrap();

    let same_units = QueryValue::number(Decimal::new(5, 0), None).with_units(
        Some("http://unitsofmeasure.org".to_string()),
        Some("mg".to_string()),
    );
    assert_eq!(
        observations
            .search_single("value-quantity", same_units)
            .await
            .unwrap()
            .len(),
        1
    );

    let other_units = QueryValue::number(Decimal::new(5, 0), None).with_units(None, Some("g".to_string()));
    assert!(
        observations
            .search_single("value-quantity", other_units)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_unsupported_comparator_is_rejected() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();
    observations
        .create(observation_quantity(5.0, "mg"))
        .await
        .unwrap();

    let err = observations
        .search_single(
            "value-quantity",
            QueryValue::number(Decimal::new(5, 0), Some(SearchPrefix::Ap)),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Schema(SchemaError::UnsupportedComparator { .. })
    ));
}

#[tokio::test]
async fn test_query_kind_must_match_parameter() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();

    let err = observations
        .search_single("value-quantity", QueryValue::code("5"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Schema(SchemaError::QueryValueMismatch { .. })
    ));
}
