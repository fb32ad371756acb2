use trellis_core::access::AccessError;
use trellis_core::criteria::CriteriaError;
use trellis_core::graph::GraphError;
use trellis_storage::CatalogError;

use crate::auth::AuthError;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("access error: {0}")]
    Access(#[from] AccessError),

    #[error("validation failed: {0}")]
    Criteria(#[from] CriteriaError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },
}

impl AdminError {
    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    /// Stable name of the failure category, independent of the layer that raised it.
    pub fn kind(&self) -> &'static str {
        match self {
            AdminError::Graph(e) => match e {
                GraphError::DuplicateId(_) => "DuplicateId",
                GraphError::NotFound(_) => "NotFound",
                GraphError::ChildConflict { .. } => "ChildConflict",
                GraphError::UnsupportedOperation { .. } => "UnsupportedOperation",
                GraphError::TypeConstraint(_) => "TypeConstraint",
                GraphError::InvalidCriteria(_) => "ValidationFailed",
            },
            AdminError::Access(e) => match e {
                AccessError::TokenInactive => "TokenInactive",
                AccessError::TokenExpired => "TokenExpired",
                AccessError::AccessDenied { .. } => "AccessDenied",
                AccessError::UnknownPrincipal(_) => "NotFound",
                AccessError::DuplicatePrincipal(_) | AccessError::DuplicateLogin(_) => {
                    "DuplicateId"
                }
            },
            AdminError::Criteria(_) => "ValidationFailed",
            AdminError::Catalog(e) => match e {
                CatalogError::DuplicateProduct(_)
                | CatalogError::DuplicateCountry(_)
                | CatalogError::DuplicateDevice(_) => "DuplicateId",
                CatalogError::UnknownCountry { .. } | CatalogError::UnknownDevice { .. } => {
                    "NotFound"
                }
                CatalogError::InvalidProduct { .. }
                | CatalogError::InvalidCountry { .. }
                | CatalogError::InvalidDevice { .. } => "ValidationFailed",
            },
            AdminError::Auth(e) => match e {
                AuthError::UnknownLogin(_) => "NotFound",
                AuthError::InvalidCredentials | AuthError::Internal(_) => "AuthenticationFailed",
            },
            AdminError::NotFound { .. } => "NotFound",
        }
    }
}
