use crate::errors::RelationError;
use crate::graph::{Node, RelationType, ResourceType};

/// Read-only view over a resource graph.
///
/// Everything that consumes inventory data (credential resolution, queries)
/// goes through this trait, so an in-memory fixture can stand in for a
/// file-backed `ResourceGraph`.
pub trait GraphSource {
    /// Node with exactly this id, if any.
    fn node(&self, id: &str) -> Option<&Node>;

    /// Nodes reached from `from` by outgoing relations of `relation_type`, in insertion order.
    fn related(&self, from: &Node, relation_type: RelationType) -> Vec<&Node>;

    fn nodes(&self) -> Box<dyn Iterator<Item = &Node> + '_>;

    fn find(&self, id: &str, resource_type: ResourceType) -> Option<&Node> {
        self.node(id).filter(|n| n.resource_type == resource_type)
    }

    /// The one node reached from `from` by `relation_type`.
    ///
    /// # Errors
    /// `RelationError::Missing` when there is none, `RelationError::Ambiguous` when there
    /// is more than one. Callers never pick among several.
    fn single_relation(
        &self,
        from: &Node,
        relation_type: RelationType,
    ) -> Result<&Node, RelationError> {
        let mut related = self.related(from, relation_type);
        match related.len() {
            0 => Err(RelationError::Missing { from: from.id.clone(), relation: relation_type }),
            1 => Ok(related.remove(0)),
            count => Err(RelationError::Ambiguous {
                from: from.id.clone(),
                relation: relation_type,
                count,
            }),
        }
    }
}
