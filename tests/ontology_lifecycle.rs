//! Cross-layer scenario tests for the ontology engine over the embedded
//! in-memory store.
//!
//! These cover the class lifecycle end to end: hierarchy wiring, attribute
//! signatures, instance handling, and the cascading delete with its cycle
//! guard.

use std::sync::Arc;

use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use pretty_assertions::assert_eq;

use ontograph::{MemoryGraphStore, OntologyEngine, OntologyError, RelationDirection};

fn engine() -> OntologyEngine {
    OntologyEngine::new(Arc::new(MemoryGraphStore::new()))
}

#[tokio::test]
async fn test_employment_cascade_scenario() {
    let engine = engine();
    let person = engine
        .create_class("Person", "A human being", None)
        .await
        .unwrap();
    let employee = engine
        .create_class("Employee", "A person under employment", Some(&person.uri))
        .await
        .unwrap();
    let employer = engine
        .create_class("Employer", "An employing organization", None)
        .await
        .unwrap();
    let age = engine
        .add_class_attribute(&employee.uri, "age")
        .await
        .unwrap();
    let works_for = engine
        .add_class_object_attribute(&employee.uri, "worksFor", &employer.uri)
        .await
        .unwrap();
    let o1 = engine
        .create_object(&employee.uri, "o1", "First employee")
        .await
        .unwrap();

    assert!(engine.delete_class(&employee.uri).await.unwrap());

    let store = engine.store();
    for uri in [&employee.uri, &age.uri, &works_for.uri, &o1.uri] {
        assert!(
            store.get_node_by_uri(uri).await.unwrap().is_none(),
            "{} should have been cascaded away",
            uri
        );
    }
    assert!(engine.get_class(&person.uri).await.unwrap().is_some());
    assert!(engine.get_class(&employer.uri).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_class_idempotency_preserves_state() {
    let engine = engine();
    let keeper = engine.create_class("Keeper", "", None).await.unwrap();
    let doomed = engine.create_class("Doomed", "", None).await.unwrap();
    engine.create_object(&doomed.uri, "x", "").await.unwrap();

    assert!(engine.delete_class(&doomed.uri).await.unwrap());
    let after_first = engine.store().get_all_nodes_and_arcs().await.unwrap();

    assert!(!engine.delete_class(&doomed.uri).await.unwrap());
    let after_second = engine.store().get_all_nodes_and_arcs().await.unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(after_first.len(), 1);
    assert_eq!(after_first[0].uri, keeper.uri);
}

#[tokio::test]
async fn test_direct_parents_regardless_of_depth() {
    let engine = engine();
    let top = engine.create_class("Top", "", None).await.unwrap();
    let middle = engine
        .create_class("Middle", "", Some(&top.uri))
        .await
        .unwrap();
    let bottom = engine
        .create_class("Bottom", "", Some(&middle.uri))
        .await
        .unwrap();
    let extra = engine.create_class("Extra", "", None).await.unwrap();
    engine
        .add_class_parent(&bottom.uri, &extra.uri)
        .await
        .unwrap()
        .unwrap();

    let mut parent_uris: Vec<String> = engine
        .get_class_parents(&bottom.uri)
        .await
        .unwrap()
        .into_iter()
        .map(|class| class.uri)
        .collect();
    parent_uris.sort();
    let mut expected = vec![middle.uri.clone(), extra.uri.clone()];
    expected.sort();
    assert_eq!(parent_uris, expected, "direct parents only, no ancestors");

    assert_eq!(engine.get_class_parents(&middle.uri).await.unwrap().len(), 1);
    assert!(engine.get_class_parents(&top.uri).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hierarchy_root_set() {
    let engine = engine();
    let root_a = engine.create_class("A", "", None).await.unwrap();
    engine.create_class("B", "", Some(&root_a.uri)).await.unwrap();
    let root_c = engine.create_class("C", "", None).await.unwrap();

    let mut roots: Vec<String> = engine
        .get_ontology_parent_classes()
        .await
        .unwrap()
        .into_iter()
        .map(|class| class.uri)
        .collect();
    roots.sort();
    let mut expected = vec![root_a.uri, root_c.uri];
    expected.sort();
    assert_eq!(roots, expected);
}

#[tokio::test]
async fn test_class_update_round_trip() {
    let engine = engine();
    let title: String = Word().fake();
    let description: String = Sentence(3..6).fake();
    let class = engine
        .create_class(&title, &description, None)
        .await
        .unwrap();

    let fetched = engine.get_class(&class.uri).await.unwrap().unwrap();
    assert_eq!(fetched.title.as_deref(), Some(title.as_str()));
    assert_eq!(fetched.description.as_deref(), Some(description.as_str()));

    let updated = engine
        .update_class(&class.uri, "renamed", "changed")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("renamed"));
    assert_eq!(updated.description.as_deref(), Some("changed"));

    assert!(engine
        .update_class("node_absent", "x", "y")
        .await
        .unwrap()
        .is_none());
}

#[test_log::test(tokio::test)]
async fn test_signature_reports_both_relation_sides() {
    let engine = engine();
    let employee = engine.create_class("Employee", "", None).await.unwrap();
    let employer = engine.create_class("Employer", "", None).await.unwrap();
    engine
        .add_class_attribute(&employee.uri, "age")
        .await
        .unwrap();
    let works_for = engine
        .add_class_object_attribute(&employee.uri, "worksFor", &employer.uri)
        .await
        .unwrap();

    let forward = engine.collect_signature(&employee.uri).await.unwrap();
    assert_eq!(forward.params.len(), 1);
    assert_eq!(forward.obj_params.len(), 1);
    assert_eq!(forward.obj_params[0].title.as_deref(), Some("worksFor"));
    assert_eq!(forward.obj_params[0].uri, works_for.uri);
    assert_eq!(forward.obj_params[0].target_class_uri, employer.uri);
    assert_eq!(
        forward.obj_params[0].relation_direction,
        RelationDirection::Forward
    );

    let reverse = engine.collect_signature(&employer.uri).await.unwrap();
    assert!(reverse.params.is_empty());
    assert_eq!(reverse.obj_params.len(), 1);
    assert_eq!(reverse.obj_params[0].target_class_uri, employee.uri);
    assert_eq!(
        reverse.obj_params[0].relation_direction,
        RelationDirection::Reverse
    );
}

#[tokio::test]
async fn test_wrong_guard_delete_leaves_node_intact() {
    let engine = engine();
    let class = engine.create_class("Person", "", None).await.unwrap();
    let relation = engine
        .add_class_object_attribute(&class.uri, "knows", &class.uri)
        .await
        .unwrap();

    assert!(!engine.delete_class_attribute(&relation.uri).await.unwrap());

    let node = engine
        .store()
        .get_node_by_uri(&relation.uri)
        .await
        .unwrap()
        .unwrap();
    assert!(node.has_label("ObjectProperty"));
}

#[tokio::test]
async fn test_object_lifecycle_and_denormalized_lookup() {
    let engine = engine();
    let person = engine.create_class("Person", "", None).await.unwrap();
    let robot = engine.create_class("Robot", "", None).await.unwrap();
    let alice = engine
        .create_object(&person.uri, "alice", "first")
        .await
        .unwrap();
    engine.create_object(&robot.uri, "r2", "").await.unwrap();

    assert_eq!(alice.class_uri.as_deref(), Some(person.uri.as_str()));

    let members = engine.get_class_objects(&person.uri).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].uri, alice.uri);

    let updated = engine
        .update_object(&alice.uri, "alice2", "renamed")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("alice2"));
    assert_eq!(updated.class_uri.as_deref(), Some(person.uri.as_str()));

    // Guarded delete refuses a class uri.
    assert!(!engine.delete_object(&person.uri).await.unwrap());
    assert!(engine.delete_object(&alice.uri).await.unwrap());
    assert!(engine
        .get_class_objects(&person.uri)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_cycle_fails_delete_without_damage() {
    let engine = engine();
    let a = engine.create_class("A", "", None).await.unwrap();
    let b = engine.create_class("B", "", Some(&a.uri)).await.unwrap();
    engine.add_class_parent(&a.uri, &b.uri).await.unwrap().unwrap();

    match engine.delete_class(&a.uri).await {
        Err(OntologyError::CycleDetected { uri }) => {
            assert!(uri == a.uri || uri == b.uri);
        }
        other => panic!("expected cycle detection, got {:?}", other),
    }

    assert!(engine.get_class(&a.uri).await.unwrap().is_some());
    assert!(engine.get_class(&b.uri).await.unwrap().is_some());
}
