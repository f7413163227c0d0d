//! Ontology domain logic layered on the generic graph store.
//!
//! Classes, properties, and objects are ordinary labeled nodes; this engine
//! owns the arc discipline between them (`SUBCLASS_OF`, `DOMAIN`, `RANGE`,
//! `INSTANCE_OF`) and the structural operations that depend on it: hierarchy
//! queries, signature derivation, and cascading class deletion. The subclass
//! hierarchy is expected to be a DAG but nothing enforces that at link time;
//! the closure traversal refuses cycles at read time instead.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::data::entities::{
    arcs, ClassSignature, DatatypeProperty, EntityKind, ObjectInstance, ObjectProperty,
    OntologyClass, OntologyEntity, RelationDirection, SignatureObjectParam, SignatureParam,
    CLASS_URI_KEY, DESCRIPTION_KEY, TITLE_KEY,
};
use crate::data::errors::OntologyError;
use crate::data::records::{GraphArc, GraphNode};
use crate::data::types::{GraphValue, GraphValueMapExt};
use crate::traits::graph_store::{ArcDirection, GraphStore};

/// Domain operations over ontology-labeled nodes.
///
/// Holds a shared [`GraphStore`] handle and keeps no other state; it is
/// cheap to clone behind an `Arc` and safe to call concurrently. All write
/// paths are short-lived units of work against the store (see
/// [`delete_class`](OntologyEngine::delete_class) for the one documented
/// multi-statement exception).
pub struct OntologyEngine {
    store: Arc<dyn GraphStore>,
}

/// One lazily-expanded node on the closure traversal stack.
struct ClosureFrame {
    uri: String,
    children: Vec<String>,
    next: usize,
}

impl OntologyEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn GraphStore> {
        self.store.clone()
    }

    fn labels_for(kind: EntityKind) -> Vec<String> {
        vec![kind.label().to_string()]
    }

    /// Creates a class node; when `parent_uri` is given, one `SUBCLASS_OF`
    /// arc is appended. A missing parent is not an error: the arc silently
    /// no-ops and the class comes back without a parent link, so callers
    /// needing certainty must check the linkage afterwards.
    #[instrument(skip(self, description))]
    pub async fn create_class(
        &self,
        title: &str,
        description: &str,
        parent_uri: Option<&str>,
    ) -> Result<OntologyClass, OntologyError> {
        let mut properties = HashMap::new();
        properties.insert(TITLE_KEY.to_string(), GraphValue::from(title));
        properties.insert(DESCRIPTION_KEY.to_string(), GraphValue::from(description));
        let node = self
            .store
            .create_node(properties, &Self::labels_for(EntityKind::Class))
            .await?;

        if let Some(parent_uri) = parent_uri {
            let arc = self
                .store
                .create_arc(&node.uri, parent_uri, arcs::SUBCLASS_OF, HashMap::new())
                .await?;
            if arc.is_none() {
                warn!(
                    class = %node.uri,
                    parent = %parent_uri,
                    "parent class not found, created class has no parent link"
                );
            }
        }
        debug!(uri = %node.uri, "created class");
        Ok(OntologyClass::from_node(&node))
    }

    pub async fn get_class(&self, uri: &str) -> Result<Option<OntologyClass>, OntologyError> {
        Ok(self
            .store
            .get_node_by_uri(uri)
            .await?
            .filter(|node| node.has_label(EntityKind::Class.label()))
            .map(|node| OntologyClass::from_node(&node)))
    }

    /// Whole-field overwrite of `title` and `description`. `None` when the
    /// uri is absent or the node is not a class; a guarded miss never
    /// touches the node.
    pub async fn update_class(
        &self,
        uri: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<OntologyClass>, OntologyError> {
        if self.get_class(uri).await?.is_none() {
            return Ok(None);
        }
        let mut properties = HashMap::new();
        properties.insert(TITLE_KEY.to_string(), GraphValue::from(title));
        properties.insert(DESCRIPTION_KEY.to_string(), GraphValue::from(description));
        Ok(self
            .store
            .update_node(uri, properties)
            .await?
            .map(|node| OntologyClass::from_node(&node)))
    }

    /// Cascading class deletion.
    ///
    /// Computes the reflexive-transitive set of classes that declare `uri`
    /// as an ancestor, collects every object instantiating those classes
    /// and every property whose `DOMAIN` targets them, and removes the lot
    /// (objects, then properties, then classes) as one atomic batch.
    /// Returns `false` without touching anything when `uri` is not a class.
    /// The read phase can interleave with concurrent writers; only the
    /// destructive tail is transactional. Re-running over a partially
    /// deleted subtree is safe, deletes of absent nodes are no-ops.
    #[instrument(skip(self))]
    pub async fn delete_class(&self, uri: &str) -> Result<bool, OntologyError> {
        if self.get_class(uri).await?.is_none() {
            debug!(uri = %uri, "delete_class: no class with this uri");
            return Ok(false);
        }

        let closure = self.subclass_closure(uri).await?;

        let objects = self
            .store
            .get_nodes_by_property_in(EntityKind::Object.label(), CLASS_URI_KEY, &closure)
            .await?;

        // One property can serve several closure classes; dedupe while
        // keeping discovery order.
        let mut seen: HashSet<String> = HashSet::new();
        let mut property_uris: Vec<String> = Vec::new();
        for class_uri in &closure {
            for label in [
                EntityKind::DatatypeProperty.label(),
                EntityKind::ObjectProperty.label(),
            ] {
                let attached = self
                    .store
                    .get_neighbors(class_uri, arcs::DOMAIN, ArcDirection::Incoming, Some(label))
                    .await?;
                for node in attached {
                    if seen.insert(node.uri.clone()) {
                        property_uris.push(node.uri);
                    }
                }
            }
        }

        let mut doomed: Vec<String> = objects.into_iter().map(|node| node.uri).collect();
        let object_count = doomed.len();
        doomed.extend(property_uris.iter().cloned());
        doomed.extend(closure.iter().cloned());

        let deleted = self.store.delete_nodes_by_uris(&doomed).await?;
        info!(
            root = %uri,
            classes = closure.len(),
            objects = object_count,
            properties = property_uris.len(),
            deleted,
            "cascading class delete committed"
        );
        Ok(true)
    }

    /// Appends one `SUBCLASS_OF` arc from `target_uri` to `parent_uri`.
    /// Multiple parents are structurally permitted and no cycle check runs
    /// at link time; `None` when either endpoint is absent.
    pub async fn add_class_parent(
        &self,
        target_uri: &str,
        parent_uri: &str,
    ) -> Result<Option<GraphArc>, OntologyError> {
        Ok(self
            .store
            .create_arc(target_uri, parent_uri, arcs::SUBCLASS_OF, HashMap::new())
            .await?)
    }

    /// Direct parents only, not transitive ancestry.
    pub async fn get_class_parents(&self, uri: &str) -> Result<Vec<OntologyClass>, OntologyError> {
        let nodes = self
            .store
            .get_neighbors(
                uri,
                arcs::SUBCLASS_OF,
                ArcDirection::Outgoing,
                Some(EntityKind::Class.label()),
            )
            .await?;
        Ok(nodes.iter().map(OntologyClass::from_node).collect())
    }

    /// Direct children only.
    pub async fn get_class_children(&self, uri: &str) -> Result<Vec<OntologyClass>, OntologyError> {
        let nodes = self
            .store
            .get_neighbors(
                uri,
                arcs::SUBCLASS_OF,
                ArcDirection::Incoming,
                Some(EntityKind::Class.label()),
            )
            .await?;
        Ok(nodes.iter().map(OntologyClass::from_node).collect())
    }

    /// The hierarchy's root set: classes with no parent link.
    pub async fn get_ontology_parent_classes(&self) -> Result<Vec<OntologyClass>, OntologyError> {
        let nodes = self
            .store
            .get_root_nodes(EntityKind::Class.label(), arcs::SUBCLASS_OF)
            .await?;
        Ok(nodes.iter().map(OntologyClass::from_node).collect())
    }

    /// Every class node with its outgoing arcs populated, for rendering the
    /// hierarchy and relation view.
    pub async fn get_ontology(&self) -> Result<Vec<GraphNode>, OntologyError> {
        let nodes = self.store.get_all_nodes_and_arcs().await?;
        Ok(nodes
            .into_iter()
            .filter(|node| node.has_label(EntityKind::Class.label()))
            .collect())
    }

    /// Declares a scalar attribute on a class: a `DatatypeProperty` node
    /// plus one `DOMAIN` arc.
    #[instrument(skip(self))]
    pub async fn add_class_attribute(
        &self,
        class_uri: &str,
        name: &str,
    ) -> Result<DatatypeProperty, OntologyError> {
        let mut properties = HashMap::new();
        properties.insert(TITLE_KEY.to_string(), GraphValue::from(name));
        let node = self
            .store
            .create_node(properties, &Self::labels_for(EntityKind::DatatypeProperty))
            .await?;
        let arc = self
            .store
            .create_arc(&node.uri, class_uri, arcs::DOMAIN, HashMap::new())
            .await?;
        if arc.is_none() {
            warn!(
                property = %node.uri,
                class = %class_uri,
                "class not found, attribute created without domain link"
            );
        }
        Ok(DatatypeProperty::from_node(&node))
    }

    /// Declares a typed relation from `class_uri` to `range_class_uri`: an
    /// `ObjectProperty` node plus one `DOMAIN` and one `RANGE` arc. Neither
    /// endpoint's existence is verified.
    #[instrument(skip(self))]
    pub async fn add_class_object_attribute(
        &self,
        class_uri: &str,
        name: &str,
        range_class_uri: &str,
    ) -> Result<ObjectProperty, OntologyError> {
        let mut properties = HashMap::new();
        properties.insert(TITLE_KEY.to_string(), GraphValue::from(name));
        let node = self
            .store
            .create_node(properties, &Self::labels_for(EntityKind::ObjectProperty))
            .await?;
        let domain = self
            .store
            .create_arc(&node.uri, class_uri, arcs::DOMAIN, HashMap::new())
            .await?;
        let range = self
            .store
            .create_arc(&node.uri, range_class_uri, arcs::RANGE, HashMap::new())
            .await?;
        if domain.is_none() || range.is_none() {
            warn!(
                property = %node.uri,
                domain_ok = domain.is_some(),
                range_ok = range.is_some(),
                "object attribute created with incomplete domain/range links"
            );
        }
        Ok(ObjectProperty::from_node(&node))
    }

    /// Type-guarded delete; `false` when the node is absent or carries the
    /// wrong label, and a guarded miss leaves the node intact.
    pub async fn delete_class_attribute(&self, uri: &str) -> Result<bool, OntologyError> {
        Ok(self
            .store
            .delete_node_with_label(uri, EntityKind::DatatypeProperty.label())
            .await?)
    }

    pub async fn delete_class_object_attribute(&self, uri: &str) -> Result<bool, OntologyError> {
        Ok(self
            .store
            .delete_node_with_label(uri, EntityKind::ObjectProperty.label())
            .await?)
    }

    /// Instantiates a class. The denormalized `class_uri` property and the
    /// `INSTANCE_OF` arc are always written together by this one operation.
    #[instrument(skip(self, description))]
    pub async fn create_object(
        &self,
        class_uri: &str,
        title: &str,
        description: &str,
    ) -> Result<ObjectInstance, OntologyError> {
        let mut properties = HashMap::new();
        properties.insert(TITLE_KEY.to_string(), GraphValue::from(title));
        properties.insert(DESCRIPTION_KEY.to_string(), GraphValue::from(description));
        properties.insert(CLASS_URI_KEY.to_string(), GraphValue::from(class_uri));
        let node = self
            .store
            .create_node(properties, &Self::labels_for(EntityKind::Object))
            .await?;
        let arc = self
            .store
            .create_arc(&node.uri, class_uri, arcs::INSTANCE_OF, HashMap::new())
            .await?;
        if arc.is_none() {
            warn!(
                object = %node.uri,
                class = %class_uri,
                "class not found, object created without instance link"
            );
        }
        Ok(ObjectInstance::from_node(&node))
    }

    pub async fn get_object(&self, uri: &str) -> Result<Option<ObjectInstance>, OntologyError> {
        Ok(self
            .store
            .get_node_by_uri(uri)
            .await?
            .filter(|node| node.has_label(EntityKind::Object.label()))
            .map(|node| ObjectInstance::from_node(&node)))
    }

    /// Whole-field overwrite of `title` and `description`; never touches
    /// `class_uri` or the `INSTANCE_OF` arc.
    pub async fn update_object(
        &self,
        uri: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<ObjectInstance>, OntologyError> {
        if self.get_object(uri).await?.is_none() {
            return Ok(None);
        }
        let mut properties = HashMap::new();
        properties.insert(TITLE_KEY.to_string(), GraphValue::from(title));
        properties.insert(DESCRIPTION_KEY.to_string(), GraphValue::from(description));
        Ok(self
            .store
            .update_node(uri, properties)
            .await?
            .map(|node| ObjectInstance::from_node(&node)))
    }

    pub async fn delete_object(&self, uri: &str) -> Result<bool, OntologyError> {
        Ok(self
            .store
            .delete_node_with_label(uri, EntityKind::Object.label())
            .await?)
    }

    /// Fetches a node of any ontology kind and classifies it by label.
    /// `None` when the uri is absent or the node carries no ontology label.
    pub async fn get_entity(&self, uri: &str) -> Result<Option<OntologyEntity>, OntologyError> {
        Ok(self
            .store
            .get_node_by_uri(uri)
            .await?
            .as_ref()
            .and_then(OntologyEntity::from_node))
    }

    /// Instances found through the denormalized `class_uri` property, not
    /// by following `INSTANCE_OF` arcs.
    pub async fn get_class_objects(
        &self,
        class_uri: &str,
    ) -> Result<Vec<ObjectInstance>, OntologyError> {
        let nodes = self
            .store
            .get_nodes_by_property(
                EntityKind::Object.label(),
                CLASS_URI_KEY,
                &GraphValue::from(class_uri),
            )
            .await?;
        Ok(nodes.iter().map(ObjectInstance::from_node).collect())
    }

    /// Derives the full attribute signature of a class.
    ///
    /// `params` lists every `DatatypeProperty` declared on the class.
    /// `obj_params` merges two symmetric traversals: relations the class
    /// declares (`DOMAIN` here, direction `1`) and relations declared on
    /// another class that target this one (`RANGE` here, direction `-1`).
    /// Properties missing either required arc drop out naturally.
    pub async fn collect_signature(&self, class_uri: &str) -> Result<ClassSignature, OntologyError> {
        let mut signature = ClassSignature::default();

        let params = self
            .store
            .get_neighbors(
                class_uri,
                arcs::DOMAIN,
                ArcDirection::Incoming,
                Some(EntityKind::DatatypeProperty.label()),
            )
            .await?;
        for node in params {
            signature.params.push(SignatureParam {
                title: node.properties.get_string(TITLE_KEY),
                uri: node.uri,
            });
        }

        let declared = self
            .store
            .get_neighbors(
                class_uri,
                arcs::DOMAIN,
                ArcDirection::Incoming,
                Some(EntityKind::ObjectProperty.label()),
            )
            .await?;
        for property in declared {
            let targets = self
                .store
                .get_neighbors(
                    &property.uri,
                    arcs::RANGE,
                    ArcDirection::Outgoing,
                    Some(EntityKind::Class.label()),
                )
                .await?;
            for target in targets {
                signature.obj_params.push(SignatureObjectParam {
                    title: property.properties.get_string(TITLE_KEY),
                    uri: property.uri.clone(),
                    target_class_uri: target.uri,
                    relation_direction: RelationDirection::Forward,
                });
            }
        }

        let incoming = self
            .store
            .get_neighbors(
                class_uri,
                arcs::RANGE,
                ArcDirection::Incoming,
                Some(EntityKind::ObjectProperty.label()),
            )
            .await?;
        for property in incoming {
            let sources = self
                .store
                .get_neighbors(
                    &property.uri,
                    arcs::DOMAIN,
                    ArcDirection::Outgoing,
                    Some(EntityKind::Class.label()),
                )
                .await?;
            for source in sources {
                signature.obj_params.push(SignatureObjectParam {
                    title: property.properties.get_string(TITLE_KEY),
                    uri: property.uri.clone(),
                    target_class_uri: source.uri,
                    relation_direction: RelationDirection::Reverse,
                });
            }
        }

        Ok(signature)
    }

    /// Reflexive-transitive closure of `root_uri` under `SUBCLASS_OF`
    /// traversed against edge direction, in post-order. Iterative DFS with
    /// an on-path set; a back edge means the hierarchy has a cycle and the
    /// whole traversal fails with [`OntologyError::CycleDetected`]. Nodes
    /// reached twice through diamond inheritance are expanded once.
    async fn subclass_closure(&self, root_uri: &str) -> Result<Vec<String>, OntologyError> {
        let mut on_path: HashSet<String> = HashSet::new();
        let mut finished: HashSet<String> = HashSet::new();
        let mut closure: Vec<String> = Vec::new();

        on_path.insert(root_uri.to_string());
        let mut stack = vec![ClosureFrame {
            uri: root_uri.to_string(),
            children: self.child_class_uris(root_uri).await?,
            next: 0,
        }];

        while !stack.is_empty() {
            let top = stack.len() - 1;
            let next_child = {
                let frame = &stack[top];
                frame.children.get(frame.next).cloned()
            };
            match next_child {
                Some(child_uri) => {
                    stack[top].next += 1;
                    if on_path.contains(&child_uri) {
                        warn!(uri = %child_uri, "subclass hierarchy contains a cycle");
                        return Err(OntologyError::CycleDetected { uri: child_uri });
                    }
                    if finished.contains(&child_uri) {
                        continue;
                    }
                    let children = self.child_class_uris(&child_uri).await?;
                    on_path.insert(child_uri.clone());
                    stack.push(ClosureFrame {
                        uri: child_uri,
                        children,
                        next: 0,
                    });
                }
                None => {
                    if let Some(frame) = stack.pop() {
                        on_path.remove(&frame.uri);
                        finished.insert(frame.uri.clone());
                        closure.push(frame.uri);
                    }
                }
            }
        }

        debug!(root = %root_uri, size = closure.len(), "computed subclass closure");
        Ok(closure)
    }

    async fn child_class_uris(&self, uri: &str) -> Result<Vec<String>, OntologyError> {
        Ok(self
            .store
            .get_neighbors(
                uri,
                arcs::SUBCLASS_OF,
                ArcDirection::Incoming,
                Some(EntityKind::Class.label()),
            )
            .await?
            .into_iter()
            .map(|node| node.uri)
            .collect())
    }
}
