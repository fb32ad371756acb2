use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::AccessError;
use super::token::{SessionToken, TokenId};

/// A login name and the hash of its secret. The plain secret is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub login: String,
    pub secret_hash: String,
}

impl Credential {
    pub fn new(login: impl Into<String>, secret_hash: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret_hash: secret_hash.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Principal {
    id: String,
    name: String,
    entitlements: Vec<String>,
    credentials: Vec<Credential>,
    tokens: Vec<SessionToken>,
}

impl Principal {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entitlements: Vec::new(),
            credentials: Vec::new(),
            tokens: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directly held entitlement ids in grant order.
    pub fn entitlements(&self) -> &[String] {
        &self.entitlements
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn tokens(&self) -> &[SessionToken] {
        &self.tokens
    }

    pub fn holds(&self, entitlement_id: &str) -> bool {
        self.entitlements.iter().any(|e| e == entitlement_id)
    }

    pub fn credential(&self, login: &str) -> Option<&Credential> {
        self.credentials.iter().find(|c| c.login == login)
    }

    pub fn token(&self, id: &TokenId) -> Option<&SessionToken> {
        self.tokens.iter().find(|t| t.id() == *id)
    }

    pub fn token_mut(&mut self, id: &TokenId) -> Option<&mut SessionToken> {
        self.tokens.iter_mut().find(|t| t.id() == *id)
    }

    pub fn summary(&self) -> PrincipalSummary {
        PrincipalSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            entitlements: self.entitlements.clone(),
            logins: self.credentials.iter().map(|c| c.login.clone()).collect(),
            active_tokens: self.tokens.iter().filter(|t| t.is_active()).count(),
        }
    }
}

/// Principal view without secrets or token ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalSummary {
    pub id: String,
    pub name: String,
    pub entitlements: Vec<String>,
    pub logins: Vec<String>,
    pub active_tokens: usize,
}

#[derive(Debug, Default)]
pub struct PrincipalRegistry {
    principals: HashMap<String, Principal>,
    order: Vec<String>,
    token_owners: HashMap<TokenId, String>,
}

impl PrincipalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, id: &str, name: &str) -> Result<&Principal, AccessError> {
        if self.principals.contains_key(id) {
            return Err(AccessError::DuplicatePrincipal(id.to_string()));
        }
        self.order.push(id.to_string());
        Ok(self
            .principals
            .entry(id.to_string())
            .or_insert_with(|| Principal::new(id, name)))
    }

    pub fn get(&self, id: &str) -> Option<&Principal> {
        self.principals.get(id)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    /// Principals in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Principal> {
        self.order.iter().filter_map(|id| self.principals.get(id))
    }

    /// Login names are unique across every principal.
    pub fn add_credential(&mut self, principal_id: &str, credential: Credential) -> Result<(), AccessError> {
        if self.find_by_login(&credential.login).is_some() {
            return Err(AccessError::DuplicateLogin(credential.login));
        }
        let principal = self.get_mut(principal_id)?;
        principal.credentials.push(credential);
        Ok(())
    }

    pub fn find_by_login(&self, login: &str) -> Option<(&Principal, &Credential)> {
        self.iter()
            .find_map(|p| p.credential(login).map(|c| (p, c)))
    }

    /// Returns `false` when the principal already held the entitlement.
    pub fn grant(&mut self, principal_id: &str, entitlement_id: &str) -> Result<bool, AccessError> {
        let principal = self.get_mut(principal_id)?;
        if principal.holds(entitlement_id) {
            return Ok(false);
        }
        principal.entitlements.push(entitlement_id.to_string());
        Ok(true)
    }

    pub fn issue_token(&mut self, principal_id: &str, expires_at: DateTime<Utc>) -> Result<TokenId, AccessError> {
        let principal = self.get_mut(principal_id)?;
        let token = SessionToken::new(expires_at);
        let id = token.id();
        principal.tokens.push(token);
        self.token_owners.insert(id, principal_id.to_string());
        Ok(id)
    }

    /// Deactivates every token of the principal and returns how many were still active.
    pub fn invalidate_tokens(&mut self, principal_id: &str) -> Result<usize, AccessError> {
        let principal = self.get_mut(principal_id)?;
        let mut invalidated = 0;
        for token in principal.tokens.iter_mut().filter(|t| t.is_active()) {
            token.invalidate();
            invalidated += 1;
        }
        Ok(invalidated)
    }

    pub fn token_owner(&self, token: &TokenId) -> Option<&str> {
        self.token_owners.get(token).map(String::as_str)
    }

    pub(crate) fn owner_and_token_mut(&mut self, token: &TokenId) -> Option<(&str, &[String], &mut SessionToken)> {
        let owner = self.token_owners.get(token)?;
        let principal = self.principals.get_mut(owner)?;
        let Principal {
            id,
            entitlements,
            tokens,
            ..
        } = principal;
        let session = tokens.iter_mut().find(|t| t.id() == *token)?;
        Some((id.as_str(), entitlements.as_slice(), session))
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Principal, AccessError> {
        self.principals
            .get_mut(id)
            .ok_or_else(|| AccessError::UnknownPrincipal(id.to_string()))
    }
}
