mod check;
mod principal;
mod token;

pub use check::{
    AccessDecision, AccessResolver, Grant, ROOT_ENTITLEMENT, ROOT_PRINCIPAL, SessionPolicy,
};
pub use principal::{Credential, Principal, PrincipalRegistry, PrincipalSummary};
pub use token::{Clock, ManualClock, SessionToken, SystemClock, TokenId, TokenState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("session token is no longer active")]
    TokenInactive,

    #[error("session token has expired")]
    TokenExpired,

    #[error("access denied: missing permission '{permission}'")]
    AccessDenied { permission: String },

    #[error("principal '{0}' not found")]
    UnknownPrincipal(String),

    #[error("principal '{0}' already exists")]
    DuplicatePrincipal(String),

    #[error("login '{0}' is already in use")]
    DuplicateLogin(String),
}
