use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a gated request. Deny and Error are kept apart even when the
/// HTTP response hides the difference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditDecision {
    Allow,
    Deny,
    Error,
}

/// Audit event for one authorization decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzAuditEvent {
    pub id: Uuid,
    /// Caller user ID
    pub subject: String,
    pub domain: String,
    pub method: String,
    pub path: String,
    pub resource: String,
    pub action: String,
    /// Inventory id of the (path, method, permission) that was checked
    pub endpoint_id: Option<String>,
    pub decision: AuditDecision,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuthzAuditEvent {
    pub fn new(subject: &str, domain: &str, method: &str, path: &str, decision: AuditDecision) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            domain: domain.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            resource: String::new(),
            action: String::new(),
            endpoint_id: None,
            decision,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_permission(mut self, resource: &str, action: &str, endpoint_id: Option<String>) -> Self {
        self.resource = resource.to_string();
        self.action = action.to_string();
        self.endpoint_id = endpoint_id;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
