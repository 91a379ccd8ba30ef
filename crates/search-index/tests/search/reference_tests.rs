//! Reference parameter searches.

use serde_json::json;

use helios_search_index::error::{ResourceError, SchemaError, StorageError};
use helios_search_index::types::{IndexValue, QueryValue};

use crate::common::{LocationFixture, create_engine, organization};

#[tokio::test]
async fn test_partof_matches_target_id() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let campus = locations
        .create(LocationFixture::new("Campus", "active").to_json())
        .await
        .unwrap();
    let other = locations
        .create(LocationFixture::new("Other Campus", "active").to_json())
        .await
        .unwrap();
    let wing = locations
        .create(LocationFixture::new("Wing A", "active").part_of(campus.id()).to_json())
        .await
        .unwrap();

    let found = locations
        .search_single("partof", QueryValue::reference(Some("Location"), campus.id()))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), wing.id());

    let none = locations
        .search_single("partof", QueryValue::reference(None, other.id()))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_reference_row_records_target() {
    let engine = create_engine();
    let org = engine
        .dao("Organization")
        .unwrap()
        .create(organization("Acme Health"))
        .await
        .unwrap();

    let locations = engine.dao("Location").unwrap();
    let created = locations
        .create(LocationFixture::new("Depot", "active").managed_by(org.id()).to_json())
        .await
        .unwrap();

    let rows = locations.index_rows(created.id()).await.unwrap();
    let reference = rows
        .iter()
        .find(|r| r.entry.param_name == "organization")
        .unwrap();
    assert_eq!(
        reference.entry.value,
        IndexValue::Reference {
            path: "Location.managingOrganization".to_string(),
            target_type: "Organization".to_string(),
            target_id: org.id(),
        }
    );

    let parsed = QueryValue::parse_reference(&format!("Organization/{}", org.id())).unwrap();
    let found = locations.search_single("organization", parsed).await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_query_type_must_match_stored_type() {
    let engine = create_engine();
    let patients = engine.dao("Patient").unwrap();
    let location = engine
        .dao("Location")
        .unwrap()
        .create(LocationFixture::new("Ward", "active").to_json())
        .await
        .unwrap();

    let observations = engine.dao("Observation").unwrap();
    observations
        .create(json!({
            "resourceType": "Observation",
            "status": "final",
            "subject": {"reference": format!("Location/{}", location.id())}
        }))
        .await
        .unwrap();

    let as_location = observations
        .search_single("subject", QueryValue::reference(Some("Location"), location.id()))
        .await
        .unwrap();
    assert_eq!(as_location.len(), 1);

    let as_patient = observations
        .search_single("subject", QueryValue::reference(Some("Patient"), location.id()))
        .await
        .unwrap();
    assert!(as_patient.is_empty());

    assert!(patients.read(location.id()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_reference_type_from_declared_type() {
    let engine = create_engine();
    let org = engine
        .dao("Organization")
        .unwrap()
        .create(organization("Acme Health"))
        .await
        .unwrap();

    let observations = engine.dao("Observation").unwrap();
    let created = observations
        .create(json!({
            "resourceType": "Observation",
            "status": "final",
            "performer": [{"reference": org.id().to_string(), "type": "Organization"}]
        }))
        .await
        .unwrap();

    let found = observations
        .search_single("performer", QueryValue::reference(Some("Organization"), org.id()))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), created.id());
}

#[tokio::test]
async fn test_unresolvable_reference_type() {
    let engine = create_engine();
    let observations = engine.dao("Observation").unwrap();

    // subject allows several target types, so a bare id is ambiguous.
    let err = observations
        .create(json!({
            "resourceType": "Observation",
            "status": "final",
            "subject": {"reference": "12"}
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Schema(SchemaError::UnresolvedReferenceType { .. })
    ));
}

#[tokio::test]
async fn test_non_numeric_reference_id() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let err = locations
        .create(json!({
            "resourceType": "Location",
            "partOf": {"reference": "Location/not-a-number"}
        }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Resource(ResourceError::InvalidReference { .. })
    ));
}

#[tokio::test]
async fn test_contained_reference_is_skipped() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();

    let created = locations
        .create(json!({
            "resourceType": "Location",
            "status": "active",
            "partOf": {"reference": "#parent"}
        }))
        .await
        .unwrap();

    let rows = locations.index_rows(created.id()).await.unwrap();
    assert!(rows.iter().all(|r| r.entry.param_name != "partof"));
}
