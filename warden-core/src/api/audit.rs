use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use warden_identity::{AuditDecision, AuthzAuditEvent};

pub async fn list_audit_events(State(state): State<AppState>) -> Json<serde_json::Value> {
    let audit_log = state.audit_log.read().await;
    let events: Vec<&AuthzAuditEvent> = audit_log.iter().rev().take(100).collect();
    Json(serde_json::json!({
        "events": events,
        "total": audit_log.len(),
    }))
}

#[derive(Serialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub allow_count: usize,
    pub deny_count: usize,
    pub error_count: usize,
    pub recent_paths: Vec<String>,
}

pub async fn audit_stats(State(state): State<AppState>) -> Json<AuditStats> {
    let audit_log = state.audit_log.read().await;
    let count = |decision: AuditDecision| audit_log.iter().filter(|e| e.decision == decision).count();

    let recent_paths: Vec<String> = audit_log
        .iter()
        .rev()
        .take(10)
        .map(|e| format!("{} {}", e.method, e.path))
        .collect();

    Json(AuditStats {
        total_events: audit_log.len(),
        allow_count: count(AuditDecision::Allow),
        deny_count: count(AuditDecision::Deny),
        error_count: count(AuditDecision::Error),
        recent_paths,
    })
}
