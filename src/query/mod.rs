use crate::graph::{props, GraphSource, Node, RelationType, ResourceType};

/// Query trait implemented by all query types.
///
/// Given a read-only graph, returns a result of type `R`.
pub trait Query<R> {
    fn run<G: GraphSource + ?Sized>(&self, graph: &G) -> R;
}

/// List resources, optionally restricted to one type.
///
/// Returns clones sorted by id.
#[derive(Debug, Clone, Default)]
pub struct ResourcesQuery {
    pub resource_type: Option<ResourceType>,
}

impl ResourcesQuery {
    #[must_use]
    pub fn new(resource_type: Option<ResourceType>) -> Self {
        Self { resource_type }
    }
}

impl Query<Vec<Node>> for ResourcesQuery {
    fn run<G: GraphSource + ?Sized>(&self, graph: &G) -> Vec<Node> {
        let mut out: Vec<Node> = graph
            .nodes()
            .filter(|n| self.resource_type.map_or(true, |t| n.resource_type == t))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

/// Instances linked to a key pair, matched by key pair id or by its `name` property.
#[derive(Debug, Clone)]
pub struct KeyPairUsersQuery {
    pub key_pair: String,
}

impl KeyPairUsersQuery {
    pub fn new(key_pair: impl Into<String>) -> Self {
        Self { key_pair: key_pair.into() }
    }

    fn matches(&self, node: &Node) -> bool {
        node.id == self.key_pair || node.property(props::NAME) == Some(self.key_pair.as_str())
    }
}

impl Query<Vec<Node>> for KeyPairUsersQuery {
    fn run<G: GraphSource + ?Sized>(&self, graph: &G) -> Vec<Node> {
        let mut out: Vec<Node> = graph
            .nodes()
            .filter(|n| n.resource_type == ResourceType::Instance)
            .filter(|inst| {
                graph.related(inst, RelationType::HasKeyPair).into_iter().any(|kp| self.matches(kp))
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
