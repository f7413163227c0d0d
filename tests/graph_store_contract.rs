//! Behavioral contract of the `GraphStore` trait, exercised against the
//! embedded in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use pretty_assertions::assert_eq;

use ontograph::{GraphStore, GraphValue, MemoryGraphStore};

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn props(pairs: &[(&str, GraphValue)]) -> HashMap<String, GraphValue> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn test_round_trip_preserves_title_and_labels() {
    let store = MemoryGraphStore::new();
    let created = store
        .create_node(props(&[("title", GraphValue::from("X"))]), &labels(&["Class"]))
        .await
        .unwrap();

    let fetched = store.get_node_by_uri(&created.uri).await.unwrap().unwrap();
    assert_eq!(fetched.get("title"), Some(&GraphValue::from("X")));
    assert!(fetched.has_label("Class"));
    assert_eq!(fetched.uri, created.uri);
}

#[tokio::test]
async fn test_update_merges_instead_of_replacing() {
    let store = MemoryGraphStore::new();
    let created = store
        .create_node(
            props(&[
                ("title", GraphValue::from("X")),
                ("description", GraphValue::from("old")),
            ]),
            &labels(&["Class"]),
        )
        .await
        .unwrap();

    let updated = store
        .update_node(
            &created.uri,
            props(&[
                ("description", GraphValue::from("new")),
                ("extra", GraphValue::Integer(1)),
            ]),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.uri, created.uri);
    assert_eq!(updated.get("title"), Some(&GraphValue::from("X")));
    assert_eq!(updated.get("description"), Some(&GraphValue::from("new")));
    assert_eq!(updated.get("extra"), Some(&GraphValue::Integer(1)));
}

#[tokio::test]
async fn test_duplicate_arcs_accumulate() {
    let store = MemoryGraphStore::new();
    let a = store.create_node(HashMap::new(), &[]).await.unwrap();
    let b = store.create_node(HashMap::new(), &[]).await.unwrap();

    let first = store
        .create_arc(&a.uri, &b.uri, "LINKS_TO", HashMap::new())
        .await
        .unwrap()
        .unwrap();
    let second = store
        .create_arc(&a.uri, &b.uri, "LINKS_TO", HashMap::new())
        .await
        .unwrap()
        .unwrap();
    assert_ne!(first.id, second.id);

    let graph = store.get_all_nodes_and_arcs().await.unwrap();
    let source = graph.iter().find(|node| node.uri == a.uri).unwrap();
    assert_eq!(source.arcs.len(), 2);
    assert!(source.arcs.iter().all(|arc| arc.arc_type == "LINKS_TO"));
}

#[tokio::test]
async fn test_batch_delete_counts_only_removed() {
    let store = MemoryGraphStore::new();
    let a = store.create_node(HashMap::new(), &[]).await.unwrap();
    let b = store.create_node(HashMap::new(), &[]).await.unwrap();

    let uris = vec![
        a.uri.clone(),
        a.uri.clone(),
        "node_missing000".to_string(),
        b.uri.clone(),
    ];
    assert_eq!(store.delete_nodes_by_uris(&uris).await.unwrap(), 2);
    assert!(store.get_node_by_uri(&a.uri).await.unwrap().is_none());
    assert!(store.get_node_by_uri(&b.uri).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_creates_allocate_distinct_uris() {
    let store = Arc::new(MemoryGraphStore::new());
    let tasks: Vec<_> = (0..32i64)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .create_node(props(&[("n", GraphValue::Integer(i))]), &[])
                    .await
            })
        })
        .collect();

    let mut uris = HashSet::new();
    for joined in join_all(tasks).await {
        let node = joined.unwrap().unwrap();
        assert!(uris.insert(node.uri), "duplicate uri handed out");
    }
    assert_eq!(store.get_nodes_by_labels(&[]).await.unwrap().len(), 32);
}

#[tokio::test]
async fn test_root_scan_ignores_cross_label_arcs() {
    let store = MemoryGraphStore::new();
    let class = store
        .create_node(HashMap::new(), &labels(&["Class"]))
        .await
        .unwrap();
    let document = store
        .create_node(HashMap::new(), &labels(&["Document"]))
        .await
        .unwrap();
    store
        .create_arc(&class.uri, &document.uri, "SUBCLASS_OF", HashMap::new())
        .await
        .unwrap()
        .unwrap();

    // An outgoing arc to a differently labeled node does not demote a root.
    let roots = store.get_root_nodes("Class", "SUBCLASS_OF").await.unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].uri, class.uri);
}
