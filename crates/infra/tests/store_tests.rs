use futures_util::TryStreamExt;
use infra::store::{
    Comparison, DocumentKey, DocumentStore, IndexStatus, Predicate, PredicateQuery, StoreError,
};
use serde_json::json;

#[tokio::test]
async fn test_put_then_get_returns_same_document() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    let doc = json!({
        "id": "p-1",
        "team": { "name": "Hawks", "wins": 3, "loses": 1 },
        "stats": { "goals": 4, "assists": 2 },
        "age": 22,
        "number": "09",
        "email": "p1@example.com"
    });
    let key = DocumentKey::player("p-1");

    store.put(&handle, &key, doc.clone()).await.unwrap();
    let fetched = store.get(&handle, &key).await.unwrap();

    assert_eq!(fetched, doc);
}

#[tokio::test]
async fn test_put_replaces_existing_document() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();
    let key = DocumentKey::player("p-1");

    store.put(&handle, &key, json!({ "age": 20 })).await.unwrap();
    store.put(&handle, &key, json!({ "age": 21 })).await.unwrap();

    assert_eq!(store.get(&handle, &key).await.unwrap(), json!({ "age": 21 }));
}

#[tokio::test]
async fn test_get_missing_key_is_not_found() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    let err = store
        .get(&handle, &DocumentKey::player("missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}

#[tokio::test]
async fn test_put_rejects_non_object_documents() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    let err = store
        .put(&handle, &DocumentKey::player("p-1"), json!([1, 2, 3]))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Write(_)));
}

#[tokio::test]
async fn test_remove_deletes_document() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();
    let key = DocumentKey::player("p-1");

    store.put(&handle, &key, json!({ "id": "p-1" })).await.unwrap();

    assert!(store.remove(&handle, &key).await.unwrap());
    assert!(!store.remove(&handle, &key).await.unwrap());
    assert!(store.get(&handle, &key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_open_twice_returns_cached_handle() {
    let store = DocumentStore::in_memory();

    let first = store.open("players").await.unwrap();
    let second = store.open("players").await.unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(store.open_handles(), 1);
}

#[tokio::test]
async fn test_concurrent_first_open_converges_on_one_handle() {
    let store = DocumentStore::in_memory();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.open("players").await.unwrap() })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    assert!(handles.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    assert_eq!(store.open_handles(), 1);
}

#[tokio::test]
async fn test_open_rejects_invalid_collection_names() {
    let store = DocumentStore::in_memory();

    for name in ["", "1players", "players; DROP TABLE x", "pla-yers"] {
        let err = store.open(name).await.unwrap_err();
        assert!(
            matches!(err, StoreError::Collection { .. }),
            "{name:?} should be rejected, got {err:?}"
        );
    }
    assert_eq!(store.open_handles(), 0);
}

#[tokio::test]
async fn test_ensure_index_is_idempotent() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    assert_eq!(store.ensure_index(&handle).await.unwrap(), IndexStatus::Created);
    assert_eq!(
        store.ensure_index(&handle).await.unwrap(),
        IndexStatus::AlreadyPresent
    );

    let reopened = store.open("players").await.unwrap();
    assert_eq!(
        store.ensure_index(&reopened).await.unwrap(),
        IndexStatus::AlreadyPresent
    );
}

#[tokio::test]
async fn test_query_filters_by_key_prefix() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    store
        .put(&handle, &DocumentKey::player("a"), json!({ "id": "a" }))
        .await
        .unwrap();
    store
        .put(&handle, &DocumentKey::new("t", "hawks"), json!({ "name": "Hawks" }))
        .await
        .unwrap();
    store
        .put(&handle, &DocumentKey::player("b"), json!({ "id": "b" }))
        .await
        .unwrap();

    let docs: Vec<_> = store
        .query(&handle, PredicateQuery::with_key_prefix("u:"))
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(docs, vec![json!({ "id": "a" }), json!({ "id": "b" })]);
}

#[tokio::test]
async fn test_query_applies_predicates_and_limit() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    for (id, age, goals) in [("a", 19, 1), ("b", 24, 7), ("c", 31, 12), ("d", 27, 0)] {
        store
            .put(
                &handle,
                &DocumentKey::player(id),
                json!({ "id": id, "age": age, "stats": { "goals": goals } }),
            )
            .await
            .unwrap();
    }

    let query = PredicateQuery::with_key_prefix("u:")
        .filter(Predicate::new("age", Comparison::Gte, 24))
        .filter(Predicate::new("stats.goals", Comparison::Gt, 0));
    let ids: Vec<String> = store
        .query(&handle, query)
        .unwrap()
        .map_ok(|doc| doc["id"].as_str().unwrap_or_default().to_string())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(ids, vec!["b", "c"]);

    let limited: Vec<_> = store
        .query(&handle, PredicateQuery::all().limit(2))
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn test_malformed_query_is_rejected() {
    let store = DocumentStore::in_memory();
    let handle = store.open("players").await.unwrap();

    let bad_path = PredicateQuery::all().filter(Predicate::new("stats..goals", Comparison::Eq, 1));
    assert!(matches!(
        store.query(&handle, bad_path),
        Err(StoreError::Query(_))
    ));

    let bad_limit = PredicateQuery::all().limit(-1);
    assert!(matches!(
        store.query(&handle, bad_limit),
        Err(StoreError::Query(_))
    ));
}

#[test]
fn test_document_key_format() {
    let key = DocumentKey::player("1234");

    assert_eq!(key.as_str(), "u:1234");
    assert_eq!(key.parts(), Some(("u", "1234")));
    assert_eq!(DocumentKey::kind_prefix("u"), "u:");
}
