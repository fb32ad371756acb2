use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::graph::GraphStore;
use crate::node::EntitlementKind;

use super::AccessError;
use super::principal::PrincipalRegistry;
use super::token::{TokenId, TokenState};

pub const ROOT_PRINCIPAL: &str = "system_admin";
pub const ROOT_ENTITLEMENT: &str = "root_access";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub ttl: Duration,
    pub renewal: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(30),
            renewal: Duration::minutes(30),
        }
    }
}

impl SessionPolicy {
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Grant {
    RootPrincipal,
    RootEntitlement,
    Entitlement(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub principal_id: String,
    pub granted_by: Grant,
}

#[derive(Debug, Clone)]
pub struct AccessResolver {
    policy: SessionPolicy,
    root_principal: String,
    root_entitlement: String,
}

impl Default for AccessResolver {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

impl AccessResolver {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            root_principal: ROOT_PRINCIPAL.to_string(),
            root_entitlement: ROOT_ENTITLEMENT.to_string(),
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn root_principal(&self) -> &str {
        &self.root_principal
    }

    pub fn root_entitlement(&self) -> &str {
        &self.root_entitlement
    }

    /// Decides whether the token's principal holds `permission`.
    ///
    /// Token state is checked before anything else: an inactive token fails with
    /// `TokenInactive` even if it has also expired. A token that passes is renewed, even when
    /// the check itself ends in `AccessDenied`.
    pub fn check(
        &self,
        registry: &mut PrincipalRegistry,
        graph: &GraphStore<EntitlementKind>,
        token: &TokenId,
        permission: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, AccessError> {
        let Some((principal_id, entitlements, session)) = registry.owner_and_token_mut(token)
        else {
            tracing::debug!(token = %token, permission, "unknown token");
            return Err(AccessError::AccessDenied {
                permission: permission.to_string(),
            });
        };

        match session.state(now) {
            TokenState::Inactive => return Err(AccessError::TokenInactive),
            TokenState::Expired => return Err(AccessError::TokenExpired),
            TokenState::Active => session.renew(self.policy.renewal),
        }

        let granted_by = if principal_id == self.root_principal {
            Some(Grant::RootPrincipal)
        } else {
            entitlements
                .iter()
                .find_map(|held| self.resolve_entitlement(graph, held, permission))
        };

        match granted_by {
            Some(granted_by) => {
                tracing::debug!(principal = %principal_id, permission, ?granted_by, "access granted");
                Ok(AccessDecision {
                    principal_id: principal_id.to_string(),
                    granted_by,
                })
            }
            None => {
                tracing::debug!(principal = %principal_id, permission, "access denied");
                Err(AccessError::AccessDenied {
                    permission: permission.to_string(),
                })
            }
        }
    }

    fn resolve_entitlement(
        &self,
        graph: &GraphStore<EntitlementKind>,
        held: &str,
        permission: &str,
    ) -> Option<Grant> {
        if held == self.root_entitlement {
            return Some(Grant::RootEntitlement);
        }

        // Entitlements that no longer resolve are skipped.
        let node = graph.get(held)?;
        if node.is_leaf() {
            return (node.id() == permission).then(|| Grant::Entitlement(held.to_string()));
        }

        let traversal = graph.traverse(held).ok().flatten()?;
        traversal
            .walk(graph)
            .any(|visit| visit.is_leaf() && visit.id() == permission)
            .then(|| Grant::Entitlement(held.to_string()))
    }
}
