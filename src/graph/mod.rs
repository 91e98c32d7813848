//! Resource graph model.
//!
//! This module defines the inventory data structures (`ResourceGraph`, `Node`,
//! `Relation`) and the JSON file form they are persisted in. A graph is
//! validated when constructed and never mutated afterwards; consumers read it
//! through the `GraphSource` trait in `source`.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use crate::errors::GraphError;

pub mod source;

pub use source::GraphSource;

/// Well-known property names.
pub mod props {
    pub const PUBLIC_IP: &str = "public_ip";
    pub const PRIVATE_IP: &str = "private_ip";
    pub const NAME: &str = "name";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Instance,
    KeyPair,
    Vpc,
    Subnet,
    SecurityGroup,
}

impl ResourceType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Instance => "instance",
            ResourceType::KeyPair => "key_pair",
            ResourceType::Vpc => "vpc",
            ResourceType::Subnet => "subnet",
            ResourceType::SecurityGroup => "security_group",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    HasKeyPair,
    ParentOf,
    AppliesOn,
}

impl RelationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::HasKeyPair => "has_key_pair",
            RelationType::ParentOf => "parent_of",
            RelationType::AppliesOn => "applies_on",
        }
    }

    /// Required `(from, to)` resource types, when the relation constrains them.
    #[must_use]
    pub fn endpoint_types(&self) -> Option<(ResourceType, ResourceType)> {
        match self {
            RelationType::HasKeyPair => Some((ResourceType::Instance, ResourceType::KeyPair)),
            RelationType::ParentOf | RelationType::AppliesOn => None,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Node {
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self { id: id.into(), resource_type, properties: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Property value, with empty strings treated as absent.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub from: String,
    pub to: String,
}

impl Relation {
    pub fn new(relation_type: RelationType, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self { relation_type, from: from.into(), to: to.into() }
    }
}

// On-disk shape; indexes are rebuilt on load.
#[derive(Debug, Serialize, Deserialize, Default)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    relations: Vec<Relation>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    nodes: Vec<Node>,
    relations: Vec<Relation>,
    // node id -> position in `nodes`
    index: HashMap<String, usize>,
    // node id -> positions in `relations` of outgoing edges, insertion order
    outgoing: HashMap<String, Vec<usize>>,
}

impl ResourceGraph {
    /// Build a graph from nodes and relations.
    ///
    /// # Errors
    /// Returns `GraphError::DuplicateNode` when two nodes share an id and
    /// `GraphError::DanglingRelation` when a relation endpoint is not a node, and
    /// `GraphError::RelationEndpoint` when a typed relation joins the wrong kinds of node.
    pub fn new(nodes: Vec<Node>, relations: Vec<Relation>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode { id: node.id.clone() });
            }
        }
        let mut outgoing: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, rel) in relations.iter().enumerate() {
            let (Some(&from), Some(&to)) = (index.get(&rel.from), index.get(&rel.to)) else {
                return Err(GraphError::DanglingRelation {
                    relation: rel.relation_type,
                    from: rel.from.clone(),
                    to: rel.to.clone(),
                });
            };
            if let Some((from_type, to_type)) = rel.relation_type.endpoint_types() {
                if nodes[from].resource_type != from_type || nodes[to].resource_type != to_type {
                    return Err(GraphError::RelationEndpoint {
                        relation: rel.relation_type,
                        from: rel.from.clone(),
                        to: rel.to.clone(),
                    });
                }
            }
            outgoing.entry(rel.from.clone()).or_default().push(i);
        }
        Ok(Self { nodes, relations, index, outgoing })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Parse a graph from its JSON form.
    ///
    /// # Errors
    /// Returns `GraphError::Decode` for malformed JSON, or a validation error from `new`.
    pub fn from_json_str(data: &str) -> Result<Self, GraphError> {
        Self::decode(data, Path::new("<memory>"))
    }

    fn decode(data: &str, path: &Path) -> Result<Self, GraphError> {
        let file: GraphFile = serde_json::from_str(data).map_err(|e| GraphError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::new(file.nodes, file.relations)
    }

    /// Load a graph from a JSON file.
    ///
    /// # Errors
    /// Returns `GraphError::Io` if reading fails, `GraphError::Decode` if the JSON is
    /// invalid, or a validation error.
    pub fn load_json(path: &Path) -> Result<Self, GraphError> {
        let data = std::fs::read_to_string(path)?;
        let graph = Self::decode(&data, path)?;
        tracing::debug!(
            path = %path.display(),
            nodes = graph.nodes.len(),
            relations = graph.relations.len(),
            "loaded resource graph"
        );
        Ok(graph)
    }

    /// Save the graph as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `GraphError::Io` if serialization or writing the file fails.
    pub fn save_json(&self, path: &Path) -> Result<(), GraphError> {
        let file = GraphFile { nodes: self.nodes.clone(), relations: self.relations.clone() };
        let data = serde_json::to_string_pretty(&file)
            .map_err(|e| GraphError::Io(std::io::Error::other(e.to_string())))?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

impl GraphSource for ResourceGraph {
    fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    fn related(&self, from: &Node, relation_type: RelationType) -> Vec<&Node> {
        let Some(edges) = self.outgoing.get(&from.id) else {
            return Vec::new();
        };
        edges
            .iter()
            .map(|&i| &self.relations[i])
            .filter(|r| r.relation_type == relation_type)
            .filter_map(|r| self.node(&r.to))
            .collect()
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        Box::new(self.nodes.iter())
    }
}
