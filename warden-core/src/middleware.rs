use crate::state::AppState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use warden_endpoint::collector::records_for;
use warden_endpoint::{PermissionTuple, RouteIntrospector, RouteRegistry};
use warden_identity::{AuditDecision, AuthzAuditEvent};

/// One permission a route requires, with its inventory id
#[derive(Debug, Clone)]
pub struct RouteGuard {
    pub endpoint_id: String,
    pub permission: PermissionTuple,
}

/// (METHOD, route template) -> guards, built from the same registry and
/// identity scheme as the published inventory.
#[derive(Debug, Default)]
pub struct RouteGuards {
    table: HashMap<(String, String), Vec<RouteGuard>>,
}

impl RouteGuards {
    pub fn from_registry(registry: &RouteRegistry) -> Self {
        let introspector = RouteIntrospector::new(Arc::new(registry.clone()));
        let mut table: HashMap<(String, String), Vec<RouteGuard>> = HashMap::new();
        for handler in introspector.list_handlers() {
            let Ok(records) = records_for(&handler) else {
                continue;
            };
            for record in records {
                let permission = record.permission();
                table
                    .entry((record.method, record.path))
                    .or_default()
                    .push(RouteGuard {
                        endpoint_id: record.id,
                        permission,
                    });
            }
        }
        Self { table }
    }

    /// axum serves HEAD through a GET route, so HEAD falls back to the GET
    /// guards unless HEAD was registered itself.
    pub fn lookup(&self, method: &str, path: &str) -> Option<&[RouteGuard]> {
        let key = |m: &str| (m.to_string(), path.to_string());
        self.table
            .get(&key(method))
            .or_else(|| match method {
                "HEAD" => self.table.get(&key("GET")),
                _ => None,
            })
            .map(Vec::as_slice)
    }
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// Authenticate the bearer token, then ask the gate whether any of the
/// caller's roles holds one of the route's permissions.
///
/// Allow, deny and store faults are logged and audited separately. Denials
/// answer 403, faults 500 with a body that does not describe the fault.
pub async fn require_permission(
    State(state): State<AppState>,
    matched: Option<MatchedPath>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().as_str().to_string();
    let path = matched
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = match state.jwt_service.validate_bearer(header) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(%method, %path, error = %e, "Rejected unauthenticated request");
            return reject(StatusCode::UNAUTHORIZED, "Authentication required");
        }
    };

    let Some(guards) = state.route_guards.lookup(&method, &path) else {
        error!(%method, %path, "Route missing from guard table");
        state
            .record_audit(
                AuthzAuditEvent::new(&claims.sub, &claims.domain, &method, &path, AuditDecision::Deny)
                    .with_reason("route not registered"),
            )
            .await;
        return reject(StatusCode::FORBIDDEN, "Forbidden");
    };

    let required: Vec<&RouteGuard> = guards
        .iter()
        .filter(|g| !g.permission.is_unrestricted())
        .collect();
    if required.is_empty() {
        request.extensions_mut().insert(claims);
        return next.run(request).await;
    }

    for guard in &required {
        let PermissionTuple { action, resource } = &guard.permission;
        let event = || {
            AuthzAuditEvent::new(&claims.sub, &claims.domain, &method, &path, AuditDecision::Allow)
                .with_permission(resource, action, Some(guard.endpoint_id.clone()))
        };

        match state
            .gate
            .decide(&claims.roles, resource, action, &claims.domain)
            .await
        {
            Ok(decision) if decision.allowed => {
                info!(
                    subject = %claims.sub,
                    domain = %claims.domain,
                    %method,
                    %path,
                    role = ?decision.matched_role,
                    "Authorization granted"
                );
                state.record_audit(event()).await;
                request.extensions_mut().insert(claims);
                return next.run(request).await;
            }
            Ok(_) => continue,
            Err(e) => {
                error!(
                    subject = %claims.sub,
                    domain = %claims.domain,
                    %method,
                    %path,
                    error = %e,
                    "Authorization check failed"
                );
                let mut audit = event().with_reason(e.to_string());
                audit.decision = AuditDecision::Error;
                state.record_audit(audit).await;
                return reject(StatusCode::INTERNAL_SERVER_ERROR, "Authorization unavailable");
            }
        }
    }

    let needed: Vec<String> = required.iter().map(|g| g.permission.to_string()).collect();
    warn!(
        subject = %claims.sub,
        domain = %claims.domain,
        %method,
        %path,
        roles = ?claims.roles,
        needed = ?needed,
        "Authorization denied"
    );
    let first = &required[0];
    let audit = AuthzAuditEvent::new(&claims.sub, &claims.domain, &method, &path, AuditDecision::Deny)
        .with_permission(
            &first.permission.resource,
            &first.permission.action,
            Some(first.endpoint_id.clone()),
        )
        .with_reason(format!("none of {:?} granted", needed));
    state.record_audit(audit).await;
    reject(StatusCode::FORBIDDEN, "Forbidden")
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_endpoint::RegisteredHandler;

    fn guards() -> RouteGuards {
        RouteGuards::from_registry(&RouteRegistry::new(vec![
            RegisteredHandler::route("UserController", "/users", "/", "GET").with_permission("user:read"),
            RegisteredHandler::route("UserController", "/users", "/", "HEAD").with_permission("user:peek"),
            RegisteredHandler::route("AuditController", "/audit", "/", "GET").with_permission("audit:read"),
        ]))
    }

    #[test]
    fn test_head_falls_back_to_get_guards() {
        let guards = guards();
        let audit = guards.lookup("HEAD", "/audit").unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].permission, PermissionTuple::new("read", "audit"));
    }

    #[test]
    fn test_registered_head_wins_over_get() {
        let guards = guards();
        let users = guards.lookup("HEAD", "/users").unwrap();
        assert_eq!(users[0].permission, PermissionTuple::new("peek", "user"));
    }

    #[test]
    fn test_other_methods_do_not_fall_back() {
        let guards = guards();
        assert!(guards.lookup("POST", "/audit").is_none());
        assert!(guards.lookup("HEAD", "/missing").is_none());
    }
}
