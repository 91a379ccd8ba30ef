//! AND-of-OR composition properties.

use helios_search_index::error::{SearchError, StorageError};
use helios_search_index::types::{QueryValue, ResourceId, SearchQuery};
use helios_search_index::{ResourceDao, UnknownParameterPolicy};

use crate::common::{LocationFixture, create_engine, create_engine_with_policy};

async fn seed(locations: &ResourceDao) -> Vec<ResourceId> {
    let fixtures = [
        LocationFixture::new("Main St Clinic", "active").with_identifier("urn:site", "1"),
        LocationFixture::new("Harbor Annex", "active").with_identifier("urn:site", "2"),
        LocationFixture::new("Main St Clinic", "inactive").with_identifier("urn:site", "3"),
        LocationFixture::new("Old Depot", "suspended").with_identifier("urn:site", "4"),
    ];

    let mut ids = Vec::new();
    for fixture in fixtures {
        ids.push(locations.create(fixture.to_json()).await.unwrap().id());
    }
    ids
}

async fn ids(locations: &ResourceDao, query: &SearchQuery) -> Vec<ResourceId> {
    locations
        .search(query)
        .await
        .unwrap()
        .iter()
        .map(|r| r.id())
        .collect()
}

#[tokio::test]
async fn test_empty_query_returns_all_in_id_order() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    let seeded = seed(&locations).await;

    assert_eq!(ids(&locations, &SearchQuery::new()).await, seeded);
}

#[tokio::test]
async fn test_and_across_parameters() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    let seeded = seed(&locations).await;

    let query = SearchQuery::new()
        .with("name", QueryValue::string("main st clinic"))
        .with("status", QueryValue::code("inactive"));
    assert_eq!(ids(&locations, &query).await, vec![seeded[2]]);
}

#[tokio::test]
async fn test_and_within_one_parameter() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    let seeded = seed(&locations).await;

    // Two groups under one name: each must hold.
    let query = SearchQuery::new()
        .and("status", [QueryValue::code("active"), QueryValue::code("suspended")])
        .and("status", [QueryValue::code("suspended"), QueryValue::code("inactive")]);
    assert_eq!(ids(&locations, &query).await, vec![seeded[3]]);
}

#[tokio::test]
async fn test_order_independence() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    seed(&locations).await;

    let status = [QueryValue::code("active"), QueryValue::code("inactive")];
    let name = [QueryValue::string("Main St Clinic")];
    let identifier = [QueryValue::code("1"), QueryValue::code("3"), QueryValue::code("4")];

    let forward = SearchQuery::new()
        .and("status", status.clone())
        .and("name", name.clone())
        .and("identifier", identifier.clone());
    let reverse = SearchQuery::new()
        .and("identifier", identifier)
        .and("name", name)
        .and("status", status);

    let expected = ids(&locations, &forward).await;
    assert_eq!(expected.len(), 2);
    assert_eq!(ids(&locations, &reverse).await, expected);
}

#[tokio::test]
async fn test_narrowing_is_monotonic() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    seed(&locations).await;

    let mut query = SearchQuery::new();
    let mut previous = ids(&locations, &query).await;

    let steps = [
        ("status", vec![QueryValue::code("active"), QueryValue::code("inactive")]),
        ("name", vec![QueryValue::string("Main St Clinic")]),
        ("identifier", vec![QueryValue::code("3")]),
    ];
    for (name, group) in steps {
        query = query.and(name, group);
        let current = ids(&locations, &query).await;
        assert!(current.iter().all(|id| previous.contains(id)), "{}", name);
        assert!(current.len() <= previous.len());
        previous = current;
    }
    assert_eq!(previous.len(), 1);
}

#[tokio::test]
async fn test_empty_intersection_short_circuits() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    seed(&locations).await;

    // The second parameter matches on its own but cannot revive an empty set.
    let query = SearchQuery::new()
        .with("identifier", QueryValue::code("999"))
        .with("status", QueryValue::code("active"));
    assert!(ids(&locations, &query).await.is_empty());
}

#[tokio::test]
async fn test_empty_or_group_is_ignored() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    let seeded = seed(&locations).await;

    let query = SearchQuery::new().and("status", Vec::<QueryValue>::new());
    assert_eq!(ids(&locations, &query).await, seeded);
}

#[tokio::test]
async fn test_unknown_parameter_rejected_by_default() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    seed(&locations).await;

    let err = locations
        .search(&SearchQuery::new().with("colour", QueryValue::code("blue")))
        .await
        .unwrap_err();
    match err {
        StorageError::Search(SearchError::UnknownParameter {
            resource_type,
            param_name,
        }) => {
            assert_eq!(resource_type, "Location");
            assert_eq!(param_name, "colour");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_parameter_rejected_whatever_its_position() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    seed(&locations).await;

    // "name" sorts before both unknown names and matches nothing on its own.
    for unknown in ["aaa", "zzz"] {
        let query = SearchQuery::new()
            .with("name", QueryValue::string("no such clinic"))
            .with(unknown, QueryValue::code("x"));
        let err = locations.search(&query).await.unwrap_err();
        assert!(
            matches!(
                &err,
                StorageError::Search(SearchError::UnknownParameter { param_name, .. }) if param_name == unknown
            ),
            "{}: {:?}",
            unknown,
            err
        );
    }
}

#[tokio::test]
async fn test_unknown_parameter_ignored_when_configured() {
    let engine = create_engine_with_policy(UnknownParameterPolicy::Ignore);
    let locations = engine.dao("Location").unwrap();
    let seeded = seed(&locations).await;

    let only_unknown = SearchQuery::new().with("colour", QueryValue::code("blue"));
    assert_eq!(ids(&locations, &only_unknown).await, seeded);

    let mixed = SearchQuery::new()
        .with("colour", QueryValue::code("blue"))
        .with("status", QueryValue::code("suspended"));
    assert_eq!(ids(&locations, &mixed).await, vec![seeded[3]]);
}

#[tokio::test]
async fn test_searches_are_scoped_by_type() {
    let engine = create_engine();
    let locations = engine.dao("Location").unwrap();
    seed(&locations).await;

    let organizations = engine.dao("Organization").unwrap();
    let found = organizations
        .search_single("name", QueryValue::string("Main St Clinic"))
        .await
        .unwrap();
    assert!(found.is_empty());
}
