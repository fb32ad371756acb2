pub fn audit_mutation(actor: &str, operation: &str, target: &str) {
    tracing::info!(
        target: "audit",
        event = "mutation",
        actor = actor,
        operation = operation,
        object_id = target,
        "administrative mutation applied"
    );
}

pub fn audit_login_success(principal_id: &str, login: &str) {
    tracing::info!(
        target: "audit",
        event = "login_success",
        principal_id = principal_id,
        login = login,
        "login succeeded"
    );
}

pub fn audit_login_failure(login: &str, reason: &str) {
    tracing::warn!(
        target: "audit",
        event = "login_failure",
        login = login,
        reason = reason,
        "login failed"
    );
}

pub fn audit_logout(principal_id: &str, login: &str, invalidated: usize) {
    tracing::info!(
        target: "audit",
        event = "logout",
        principal_id = principal_id,
        login = login,
        invalidated_tokens = invalidated as u64,
        "logged out"
    );
}

pub fn audit_access_denied(principal_id: Option<&str>, permission: &str, reason: &str) {
    tracing::warn!(
        target: "audit",
        event = "access_denied",
        principal_id = principal_id.unwrap_or("unknown"),
        permission = permission,
        reason = reason,
        "access denied"
    );
}


#[cfg(test)]
mod tests {
    use super::capture::audit_events;
    use super::*;

    #[test]
    fn audit_mutation_emits_actor_and_target() {
        let events = audit_events(|| {
            audit_mutation("system_admin", "create_entitlement", "editor");
        });

        assert_eq!(events.len(), 1);
        assert!(events[0].has_field("event", "mutation"));
        assert!(events[0].has_field("actor", "system_admin"));
        assert!(events[0].has_field("operation", "create_entitlement"));
        assert!(events[0].has_field("object_id", "editor"));
    }

    #[test]
    fn audit_logout_counts_tokens() {
        let events = audit_events(|| {
            audit_logout("alice", "alice@example", 3);
        });

        assert_eq!(events.len(), 1);
        assert!(events[0].has_field("event", "logout"));
        assert!(events[0].has_field("invalidated_tokens", "3"));
    }

    #[test]
    fn audit_login_failure_does_not_include_secret() {
        let events = audit_events(|| {
            audit_login_failure("alice", "invalid credentials");
        });

        assert_eq!(events.len(), 1);
        for (_, value) in &events[0].fields {
            assert!(
                !value.contains("secret"),
                "audit event should not contain secret: {value}"
            );
        }
    }

    #[test]
    fn audit_access_denied_defaults_unknown_principal() {
        let events = audit_events(|| {
            audit_access_denied(None, "create_user", "unknown token");
        });

        assert!(events[0].has_field("principal_id", "unknown"));
        assert!(events[0].has_field("permission", "create_user"));
    }

    #[test]
    fn audit_events_use_target_audit() {
        let events = audit_events(|| {
            audit_mutation("a", "b", "c");
            audit_login_success("alice", "alice");
            audit_login_failure("bob", "bad");
            audit_logout("alice", "alice", 1);
            audit_access_denied(Some("alice"), "p", "denied");
        });

        assert_eq!(events.len(), 5);
        for event in &events {
            assert_eq!(event.target, "audit");
        }
    }
}
