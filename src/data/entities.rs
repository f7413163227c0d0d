//! Typed views over ontology-labeled graph nodes.
//!
//! Every ontology entity is stored as a generic [`GraphNode`] carrying one
//! of four well-known labels; this module gives those shapes compile-time
//! structure without constraining the underlying graph model.

use serde::{Deserialize, Serialize};

use crate::data::records::GraphNode;
use crate::data::types::GraphValueMapExt;

/// Relationship kinds used by the ontology layer.
pub mod arcs {
    /// Class to parent class.
    pub const SUBCLASS_OF: &str = "SUBCLASS_OF";
    /// Property to the class it is declared on.
    pub const DOMAIN: &str = "DOMAIN";
    /// Object property to its target class.
    pub const RANGE: &str = "RANGE";
    /// Object to its owning class.
    pub const INSTANCE_OF: &str = "INSTANCE_OF";
}

/// Property key carrying an object's denormalized owning-class uri.
pub const CLASS_URI_KEY: &str = "class_uri";

/// Property keys shared by the entity shapes.
pub const TITLE_KEY: &str = "title";
pub const DESCRIPTION_KEY: &str = "description";

/// The four node kinds the ontology layer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Class,
    DatatypeProperty,
    ObjectProperty,
    Object,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Class => "Class",
            EntityKind::DatatypeProperty => "DatatypeProperty",
            EntityKind::ObjectProperty => "ObjectProperty",
            EntityKind::Object => "Object",
        }
    }

    pub fn from_label(label: &str) -> Option<EntityKind> {
        match label {
            "Class" => Some(EntityKind::Class),
            "DatatypeProperty" => Some(EntityKind::DatatypeProperty),
            "ObjectProperty" => Some(EntityKind::ObjectProperty),
            "Object" => Some(EntityKind::Object),
            _ => None,
        }
    }
}

/// An ontology concept, linked to ancestors via `SUBCLASS_OF` arcs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyClass {
    pub uri: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl OntologyClass {
    pub fn from_node(node: &GraphNode) -> OntologyClass {
        OntologyClass {
            uri: node.uri.clone(),
            title: node.properties.get_string(TITLE_KEY),
            description: node.properties.get_string(DESCRIPTION_KEY),
        }
    }
}

/// A scalar attribute declaration attached to classes via `DOMAIN` arcs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatatypeProperty {
    pub uri: String,
    pub title: Option<String>,
}

impl DatatypeProperty {
    pub fn from_node(node: &GraphNode) -> DatatypeProperty {
        DatatypeProperty {
            uri: node.uri.clone(),
            title: node.properties.get_string(TITLE_KEY),
        }
    }
}

/// A typed relation declaration between two classes (`DOMAIN` and `RANGE`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub uri: String,
    pub title: Option<String>,
}

impl ObjectProperty {
    pub fn from_node(node: &GraphNode) -> ObjectProperty {
        ObjectProperty {
            uri: node.uri.clone(),
            title: node.properties.get_string(TITLE_KEY),
        }
    }
}

/// An instance of a class. `class_uri` is a denormalized copy of the owning
/// class's uri and always written together with the `INSTANCE_OF` arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInstance {
    pub uri: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub class_uri: Option<String>,
}

impl ObjectInstance {
    pub fn from_node(node: &GraphNode) -> ObjectInstance {
        ObjectInstance {
            uri: node.uri.clone(),
            title: node.properties.get_string(TITLE_KEY),
            description: node.properties.get_string(DESCRIPTION_KEY),
            class_uri: node.properties.get_string(CLASS_URI_KEY),
        }
    }
}

/// Tagged union over the four ontology node shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum OntologyEntity {
    Class(OntologyClass),
    DatatypeProperty(DatatypeProperty),
    ObjectProperty(ObjectProperty),
    Object(ObjectInstance),
}

impl OntologyEntity {
    /// Classifies a generic node by its labels. The first recognized
    /// ontology label wins; `None` when no ontology label is present.
    pub fn from_node(node: &GraphNode) -> Option<OntologyEntity> {
        let kind = node.labels.iter().find_map(|l| EntityKind::from_label(l))?;
        Some(match kind {
            EntityKind::Class => OntologyEntity::Class(OntologyClass::from_node(node)),
            EntityKind::DatatypeProperty => {
                OntologyEntity::DatatypeProperty(DatatypeProperty::from_node(node))
            }
            EntityKind::ObjectProperty => {
                OntologyEntity::ObjectProperty(ObjectProperty::from_node(node))
            }
            EntityKind::Object => OntologyEntity::Object(ObjectInstance::from_node(node)),
        })
    }

    pub fn uri(&self) -> &str {
        match self {
            OntologyEntity::Class(c) => &c.uri,
            OntologyEntity::DatatypeProperty(p) => &p.uri,
            OntologyEntity::ObjectProperty(p) => &p.uri,
            OntologyEntity::Object(o) => &o.uri,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            OntologyEntity::Class(_) => EntityKind::Class,
            OntologyEntity::DatatypeProperty(_) => EntityKind::DatatypeProperty,
            OntologyEntity::ObjectProperty(_) => EntityKind::ObjectProperty,
            OntologyEntity::Object(_) => EntityKind::Object,
        }
    }
}

/// Which side of an object relation the inspected class occupies.
///
/// Serialized as `1` (the class is the relation's source) or `-1` (the
/// class is the target of a relation declared on another class); consumers
/// rely on this encoding to render relation arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationDirection {
    Forward,
    Reverse,
}

impl RelationDirection {
    pub fn as_i8(self) -> i8 {
        match self {
            RelationDirection::Forward => 1,
            RelationDirection::Reverse => -1,
        }
    }
}

impl Serialize for RelationDirection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for RelationDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match i8::deserialize(deserializer)? {
            1 => Ok(RelationDirection::Forward),
            -1 => Ok(RelationDirection::Reverse),
            other => Err(serde::de::Error::custom(format!(
                "invalid relation direction {}, expected 1 or -1",
                other
            ))),
        }
    }
}

/// One datatype attribute in a class signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureParam {
    pub title: Option<String>,
    pub uri: String,
}

/// One object relation in a class signature, with the side the class
/// occupies preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureObjectParam {
    pub title: Option<String>,
    pub uri: String,
    pub target_class_uri: String,
    pub relation_direction: RelationDirection,
}

/// The full attribute signature of a class.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassSignature {
    pub params: Vec<SignatureParam>,
    pub obj_params: Vec<SignatureObjectParam>,
}
