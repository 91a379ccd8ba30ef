//! Token parameter searches.

use serde_json::json;

use helios_search_index::types::{QueryValue, SearchQuery};

use crate::common::{LocationFixture, create_engine, observation_quantity};

#[tokio::test]
async fn test_status_and_name_scenario() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let clinic = locations
        .create(LocationFixture::new("Main St Clinic", "active").to_json())
        .await
        .unwrap();
    locations
        .create(LocationFixture::new("Harbor Annex", "active").to_json())
        .await
        .unwrap();

    let query = SearchQuery::new()
        .with("status", QueryValue::code("active"))
        .with("name", QueryValue::string("Main St Clinic"));
    let found = locations.search(&query).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), clinic.id());

    let suspended = locations
        .search(&SearchQuery::new().with("status", QueryValue::code("suspended")))
        .await
        .unwrap();
    assert!(suspended.is_empty());
}

#[tokio::test]
async fn test_identifier_system_and_code() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let first = locations
        .create(
            LocationFixture::new("North", "active")
                .with_identifier("urn:site", "A1")
                .to_json(),
        )
        .await
        .unwrap();
    let second = locations
        .create(
            LocationFixture::new("South", "active")
                .with_identifier("urn:other", "A1")
                .to_json(),
        )
        .await
        .unwrap();

    let by_both = locations
        .search_single("identifier", QueryValue::token("urn:site", "A1"))
        .await
        .unwrap();
    assert_eq!(by_both.len(), 1);
    assert_eq!(by_both[0].id(), first.id());

    let by_code: Vec<_> = locations
        .search_single("identifier", QueryValue::code("A1"))
        .await
        .unwrap()
        .iter()
        .map(|r| r.id())
        .collect();
    assert_eq!(by_code, vec![first.id(), second.id()]);

    let by_system = locations
        .search_single("identifier", QueryValue::parse_token("urn:other|"))
        .await
        .unwrap();
    assert_eq!(by_system.len(), 1);
    assert_eq!(by_system[0].id(), second.id());
}

#[tokio::test]
async fn test_codeable_concept_matches_any_coding() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();

    let created = observations
        .create(json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {
                "coding": [
                    {"system": "http://loinc.org", "code": "8867-4"},
                    {"system": "http://snomed.info/sct", "code": "364075005"}
                ]
            }
        }))
        .await
        .unwrap();

    for token in ["http://loinc.org|8867-4", "http://snomed.info/sct|364075005"] {
        let found = observations
            .search_single("code", QueryValue::parse_token(token))
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "{}", token);
        assert_eq!(found[0].id(), created.id());
    }

    let wrong_system = observations
        .search_single("code", QueryValue::parse_token("http://snomed.info/sct|8867-4"))
        .await
        .unwrap();
    assert!(wrong_system.is_empty());
}

#[tokio::test]
async fn test_or_group_matches_either_value() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    for status in ["active", "suspended", "inactive"] {
        locations
            .create(LocationFixture::new(status, status).to_json())
            .await
            .unwrap();
    }

    let query = SearchQuery::new().and(
        "status",
        [QueryValue::code("active"), QueryValue::code("inactive")],
    );
    let statuses: Vec<_> = locations
        .search(&query)
        .await
        .unwrap()
        .iter()
        .map(|r| r.content()["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, vec!["active", "inactive"]);
}

#[tokio::test]
async fn test_multi_type_value_only_indexes_matching_kind() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();

    // value[x] holds a Quantity, so value-concept gets no rows.
    observations
        .create(observation_quantity(72.0, "/min"))
        .await
        .unwrap();

    let found = observations
        .search_single("value-concept", QueryValue::code("/min"))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_boolean_token() {
    let engine = create_engine();
    let organizations = engine.dao("Organization").unwrap();

    organizations
        .create(json!({"resourceType": "Organization", "name": "Acme", "active": true}))
        .await
        .unwrap();

    let active = organizations
        .search_single("active", QueryValue::code("true"))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    let inactive = organizations
        .search_single("active", QueryValue::code("false"))
        .await
        .unwrap();
    assert!(inactive.is_empty());
}
