// event.rs — Audit event data model.
//
// Three things are worth an audit record: a policy set was compiled for a
// scope, an emergency override took effect, or the enforcement point denied
// a request under one of our rules. Events chain through `previous_hash`
// once a sink records them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an event records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A manifest was produced for a scope.
    PolicyCompiled,
    /// A manifest was produced with the emergency override active.
    EmergencyOverrideActivated,
    /// The enforcement point denied a request under a compiled rule.
    DenyPolicyViolation,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::PolicyCompiled => write!(f, "policy_compiled"),
            AuditAction::EmergencyOverrideActivated => write!(f, "emergency_override_activated"),
            AuditAction::DenyPolicyViolation => write!(f, "deny_policy_violation"),
        }
    }
}

/// One line in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Scope id the event concerns (`123`, `folders/45`, `my-project`).
    pub scope: String,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    /// Human-readable detail: override reason, denied permission, and so on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Hash of the preceding log line; `None` for the first event.
    pub previous_hash: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl AuditEvent {
    /// New event stamped now, with a random id and no chain link yet.
    pub fn new(scope: impl Into<String>, action: AuditAction) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            scope: scope.into(),
            action,
            rule_name: None,
            principal: None,
            detail: None,
            previous_hash: None,
            metadata: serde_json::Value::Null,
        }
    }

    /// A denial observed by the enforcement point.
    pub fn violation(
        scope: impl Into<String>,
        rule_name: impl Into<String>,
        principal: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        Self::new(scope, AuditAction::DenyPolicyViolation)
            .with_rule(rule_name)
            .with_principal(principal)
            .with_detail(format!("denied {}", permission.into()))
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_rule(mut self, rule_name: impl Into<String>) -> Self {
        self.rule_name = Some(rule_name.into());
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
