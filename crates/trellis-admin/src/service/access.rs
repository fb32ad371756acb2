use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use trellis_core::access::{
    AccessDecision, AccessError, AccessResolver, Clock, Credential, PrincipalRegistry,
    PrincipalSummary, ROOT_ENTITLEMENT, ROOT_PRINCIPAL, SessionPolicy, TokenId,
};
use trellis_core::describe::NodeRecord;
use trellis_core::graph::{GraphError, GraphStore};
use trellis_core::node::{EntitlementKind, Node};

use crate::audit;
use crate::auth::{self, AuthError, CredentialRecord};
use crate::config::BootstrapConfig;
use crate::error::AdminError;
use crate::metrics::Metrics;
use crate::permissions;

use super::clean_id;

/// Named grouping of entitlements belonging to one administrative area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub entitlements: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessInventory {
    pub services: Vec<ServiceRecord>,
    pub entitlements: Vec<NodeRecord>,
    pub principals: Vec<PrincipalSummary>,
}

#[derive(Debug)]
struct AccessState {
    entitlements: GraphStore<EntitlementKind>,
    principals: PrincipalRegistry,
    services: Vec<ServiceRecord>,
}

pub struct AccessService {
    state: Mutex<AccessState>,
    resolver: AccessResolver,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<Metrics>>,
}

impl AccessService {
    /// Builds the entitlement graph with its root entitlement and the root principal that
    /// holds it, reachable through the bootstrap login.
    pub fn new(
        policy: SessionPolicy,
        clock: Arc<dyn Clock>,
        bootstrap: &BootstrapConfig,
    ) -> Result<Self, AdminError> {
        let entitlements = GraphStore::new(Node::new(
            EntitlementKind::Role,
            ROOT_ENTITLEMENT,
            "Root access",
            "Grants every permission",
        ));

        let mut principals = PrincipalRegistry::new();
        principals.create(ROOT_PRINCIPAL, &bootstrap.user)?;
        principals.grant(ROOT_PRINCIPAL, ROOT_ENTITLEMENT)?;
        principals.add_credential(
            ROOT_PRINCIPAL,
            Credential::new(
                bootstrap.login.trim(),
                auth::hash_secret(&bootstrap.password)?,
            ),
        )?;

        tracing::info!(login = %bootstrap.login.trim(), "root principal bootstrapped");

        Ok(Self {
            state: Mutex::new(AccessState {
                entitlements,
                principals,
                services: Vec::new(),
            }),
            resolver: AccessResolver::new(policy),
            clock,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn state(&self) -> MutexGuard<'_, AccessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, f: impl FnOnce(&Metrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }

    pub fn login(&self, login: &str, secret: &str) -> Result<TokenId, AdminError> {
        let login = login.trim();
        let record = {
            let state = self.state();
            state
                .principals
                .find_by_login(login)
                .map(|(principal, credential)| CredentialRecord {
                    principal_id: principal.id().to_string(),
                    secret_hash: credential.secret_hash.clone(),
                })
        };

        let principal_id = match auth::authenticate(login, secret, |_| record) {
            Ok(id) => id,
            Err(e) => {
                self.record(Metrics::record_login_failure);
                audit::audit_login_failure(login, &e.to_string());
                return Err(e.into());
            }
        };

        let expiry = self.resolver.policy().expiry_from(self.clock.now());
        let token = self.state().principals.issue_token(&principal_id, expiry)?;

        self.record(Metrics::record_login_success);
        audit::audit_login_success(&principal_id, login);
        Ok(token)
    }

    /// Invalidates every token of the principal owning `login`.
    pub fn logout(&self, login: &str) -> Result<usize, AdminError> {
        let login = login.trim();
        let mut state = self.state();
        let principal_id = state
            .principals
            .find_by_login(login)
            .map(|(p, _)| p.id().to_string())
            .ok_or_else(|| AuthError::UnknownLogin(login.to_string()))?;

        let invalidated = state.principals.invalidate_tokens(&principal_id)?;
        audit::audit_logout(&principal_id, login, invalidated);
        Ok(invalidated)
    }

    pub fn check_access(
        &self,
        token: &TokenId,
        permission: &str,
    ) -> Result<AccessDecision, AdminError> {
        self.record(Metrics::record_check);
        let now = self.clock.now();

        let mut state = self.state();
        let AccessState {
            entitlements,
            principals,
            ..
        } = &mut *state;
        let result = self
            .resolver
            .check(principals, entitlements, token, permission, now);
        let owner = principals.token_owner(token).map(str::to_string);
        drop(state);

        match result {
            Ok(decision) => {
                self.record(Metrics::record_granted);
                Ok(decision)
            }
            Err(e) => {
                match e {
                    AccessError::TokenInactive | AccessError::TokenExpired => {
                        self.record(Metrics::record_token_rejected)
                    }
                    _ => self.record(Metrics::record_denied),
                }
                audit::audit_access_denied(owner.as_deref(), permission, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Gate used by every mutating operation. Returns the acting principal's id.
    pub(crate) fn authorize(&self, token: &TokenId, permission: &str) -> Result<String, AdminError> {
        self.check_access(token, permission)
            .map(|decision| decision.principal_id)
    }

    pub fn create_service(
        &self,
        token: &TokenId,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), AdminError> {
        let actor = self.authorize(token, permissions::DEFINE_SERVICE)?;
        let id = clean_id(id);

        let mut state = self.state();
        if state.services.iter().any(|s| s.id == id) {
            return Err(GraphError::DuplicateId(id).into());
        }
        state.services.push(ServiceRecord {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            entitlements: Vec::new(),
        });
        drop(state);

        audit::audit_mutation(&actor, "create_service", &id);
        Ok(())
    }

    /// Returns `false` when the entitlement was already part of the service.
    pub fn add_to_service(
        &self,
        token: &TokenId,
        service_id: &str,
        entitlement_id: &str,
    ) -> Result<bool, AdminError> {
        let actor = self.authorize(token, permissions::DEFINE_SERVICE)?;
        let service_id = clean_id(service_id);
        let entitlement_id = clean_id(entitlement_id);

        let mut state = self.state();
        if !state.entitlements.contains(&entitlement_id) {
            return Err(GraphError::NotFound(entitlement_id).into());
        }
        let service = state
            .services
            .iter_mut()
            .find(|s| s.id == service_id)
            .ok_or_else(|| AdminError::not_found("service", service_id.as_str()))?;
        if service.entitlements.contains(&entitlement_id) {
            return Ok(false);
        }
        service.entitlements.push(entitlement_id.clone());
        drop(state);

        audit::audit_mutation(&actor, "add_to_service", &format!("{service_id}/{entitlement_id}"));
        Ok(true)
    }

    pub fn create_entitlement(
        &self,
        token: &TokenId,
        kind: EntitlementKind,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<(), AdminError> {
        let gate = match kind {
            EntitlementKind::Permission => permissions::DEFINE_PERMISSION,
            EntitlementKind::Role => permissions::DEFINE_ROLE,
        };
        let actor = self.authorize(token, gate)?;
        let id = clean_id(id);

        self.state()
            .entitlements
            .create(Node::new(kind, id.as_str(), name, description))?;

        audit::audit_mutation(&actor, "create_entitlement", &id);
        Ok(())
    }

    pub fn attach_entitlement(
        &self,
        token: &TokenId,
        parent_id: &str,
        child_id: &str,
    ) -> Result<(), AdminError> {
        let actor = self.authorize(token, permissions::ADD_ENTITLEMENT)?;
        let (parent_id, child_id) = (clean_id(parent_id), clean_id(child_id));

        self.state().entitlements.attach(&parent_id, &child_id)?;

        audit::audit_mutation(&actor, "attach_entitlement", &format!("{parent_id}/{child_id}"));
        Ok(())
    }

    /// Returns `false` when `child_id` was not a direct child of `parent_id`.
    pub fn detach_entitlement(
        &self,
        token: &TokenId,
        parent_id: &str,
        child_id: &str,
    ) -> Result<bool, AdminError> {
        let actor = self.authorize(token, permissions::ADD_ENTITLEMENT)?;
        let (parent_id, child_id) = (clean_id(parent_id), clean_id(child_id));

        let removed = self.state().entitlements.detach(&parent_id, &child_id)?;

        if removed.is_some() {
            audit::audit_mutation(&actor, "detach_entitlement", &format!("{parent_id}/{child_id}"));
        }
        Ok(removed.is_some())
    }

    pub fn create_user(&self, token: &TokenId, id: &str, name: &str) -> Result<(), AdminError> {
        let actor = self.authorize(token, permissions::CREATE_USER)?;
        let id = clean_id(id);

        self.state().principals.create(&id, name)?;

        audit::audit_mutation(&actor, "create_user", &id);
        Ok(())
    }

    /// Returns `false` when the user already held the entitlement.
    pub fn grant_entitlement(
        &self,
        token: &TokenId,
        user_id: &str,
        entitlement_id: &str,
    ) -> Result<bool, AdminError> {
        let actor = self.authorize(token, permissions::ADD_ENTITLEMENT_TO_USER)?;
        let (user_id, entitlement_id) = (clean_id(user_id), clean_id(entitlement_id));

        let mut state = self.state();
        if !state.entitlements.contains(&entitlement_id) {
            return Err(GraphError::NotFound(entitlement_id).into());
        }
        let added = state.principals.grant(&user_id, &entitlement_id)?;
        drop(state);

        if added {
            audit::audit_mutation(&actor, "grant_entitlement", &format!("{user_id}/{entitlement_id}"));
        }
        Ok(added)
    }

    pub fn add_credential(
        &self,
        token: &TokenId,
        user_id: &str,
        login: &str,
        secret: &str,
    ) -> Result<(), AdminError> {
        let actor = self.authorize(token, permissions::ADD_CREDENTIAL_TO_USER)?;
        let user_id = clean_id(user_id);
        let login = login.trim();
        if login.is_empty() || secret.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }
        let secret_hash = auth::hash_secret(secret)?;

        self.state()
            .principals
            .add_credential(&user_id, Credential::new(login, secret_hash))?;

        audit::audit_mutation(&actor, "add_credential", &user_id);
        Ok(())
    }

    pub fn entitlement(&self, id: &str) -> Option<NodeRecord> {
        self.state().entitlements.get(id.trim()).map(Node::describe)
    }

    pub fn principal(&self, id: &str) -> Option<PrincipalSummary> {
        self.state().principals.get(id.trim()).map(|p| p.summary())
    }

    pub fn inventory(&self) -> AccessInventory {
        let state = self.state();
        AccessInventory {
            services: state.services.clone(),
            entitlements: state.entitlements.nodes().map(Node::describe).collect(),
            principals: state.principals.iter().map(|p| p.summary()).collect(),
        }
    }
}
