use std::path::PathBuf;
use thiserror::Error;

use crate::graph::RelationType;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid graph file {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Duplicate node id '{id}'")]
    DuplicateNode { id: String },

    #[error("Relation {relation} from '{from}' to '{to}' references an unknown node")]
    DanglingRelation { relation: RelationType, from: String, to: String },

    #[error("Relation {relation} from '{from}' to '{to}' joins the wrong resource types")]
    RelationEndpoint { relation: RelationType, from: String, to: String },
}

/// Failure of the single-relation accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelationError {
    #[error("'{from}' has no {relation} relation")]
    Missing { from: String, relation: RelationType },

    #[error("'{from}' has {count} {relation} relations, expected exactly one")]
    Ambiguous { from: String, relation: RelationType, count: usize },
}

impl RelationError {
    /// Number of relations actually found.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            RelationError::Missing { .. } => 0,
            RelationError::Ambiguous { count, .. } => *count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsErrorKind {
    NotFound,
    MissingAttribute,
    AmbiguousKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    #[error("instance '{id}' not found in inventory")]
    NotFound { id: String },

    #[error("resource '{id}' has no usable '{attribute}' property")]
    MissingAttribute { id: String, attribute: String },

    #[error("cannot pick a key for instance '{id}': {count} key pairs linked, exactly one required")]
    AmbiguousKey { id: String, count: usize },
}

impl CredentialsError {
    #[must_use]
    pub fn kind(&self) -> CredentialsErrorKind {
        match self {
            CredentialsError::NotFound { .. } => CredentialsErrorKind::NotFound,
            CredentialsError::MissingAttribute { .. } => CredentialsErrorKind::MissingAttribute,
            CredentialsError::AmbiguousKey { .. } => CredentialsErrorKind::AmbiguousKey,
        }
    }
}

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Stats database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid timestamp stored under '{key}': {value}")]
    InvalidTime { key: String, value: String },

    #[error("Random source unavailable: {0}")]
    Random(String),
}
