mod resolver;
mod store;
mod traversal;

pub use resolver::ResolvedGraph;
pub use store::GraphStore;
pub use traversal::{ChildRef, GraphView, Traversal, Visit, Walk};

use crate::criteria::CriteriaError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("node '{0}' already exists")]
    DuplicateId(String),

    #[error("node '{0}' not found")]
    NotFound(String),

    #[error("'{parent}' already has a child with id '{child}'")]
    ChildConflict { parent: String, child: String },

    #[error("{kind} '{id}' cannot hold children")]
    UnsupportedOperation { id: String, kind: &'static str },

    #[error("type constraint violated: {0}")]
    TypeConstraint(String),

    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),
}
