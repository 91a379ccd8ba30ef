//! String parameter searches.

use serde_json::json;

use helios_search_index::types::QueryValue;

use crate::common::{LocationFixture, create_engine};

#[tokio::test]
async fn test_name_is_case_and_whitespace_insensitive() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let created = locations
        .create(LocationFixture::new("Main St Clinic", "active").to_json())
        .await
        .unwrap();

    for query in ["Main St Clinic", "main st clinic", "  MAIN ST CLINIC "] {
        let found = locations
            .search_single("name", QueryValue::string(query))
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "{:?}", query);
        assert_eq!(found[0].id(), created.id());
    }
}

#[tokio::test]
async fn test_name_requires_whole_value() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    locations
        .create(LocationFixture::new("Main St Clinic", "active").to_json())
        .await
        .unwrap();

    let found = locations
        .search_single("name", QueryValue::string("Main"))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_address_matches_any_part() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let created = locations
        .create(
            LocationFixture::new("Depot", "active")
                .with_address(vec!["1 Main St", "Suite 2"], "Springfield")
                .to_json(),
        )
        .await
        .unwrap();

    for part in ["1 Main St", "Suite 2", "springfield"] {
        let found = locations
            .search_single("address", QueryValue::string(part))
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "{}", part);
        assert_eq!(found[0].id(), created.id());
    }
}

#[tokio::test]
async fn test_parameters_do_not_share_rows() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    // "springfield" is stored as an address row, not a name row.
    locations
        .create(
            LocationFixture::new("Depot", "active")
                .with_address(vec![], "Springfield")
                .to_json(),
        )
        .await
        .unwrap();

    let found = locations
        .search_single("name", QueryValue::string("Springfield"))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_human_name_parts() {
    let engine = create_engine();
    let patients = engine.dao("Patient").unwrap();

    let created = patients
        .create(json!({
            "resourceType": "Patient",
            "name": [{"family": "Smith", "given": ["John", "Q"]}]
        }))
        .await
        .unwrap();

    for query in ["smith", "John"] {
        let found = patients
            .search_single("name", QueryValue::string(query))
            .await
            .unwrap();
        assert_eq!(found.len(), 1, "{}", query);
        assert_eq!(found[0].id(), created.id());
    }

    let family = patients
        .search_single("family", QueryValue::string("Smith"))
        .await
        .unwrap();
    assert_eq!(family.len(), 1);

    let given_as_family = patients
        .search_single("family", QueryValue::string("John"))
        .await
        .unwrap();
    assert!(given_as_family.is_empty());
}
