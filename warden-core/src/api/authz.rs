use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use warden_identity::jwt::WardenClaims;
use warden_policy::{
    AuthzCheckRequest, AuthzDecision, PermissionGrant, PolicyAdmin, PolicyError, PolicyRule,
    RoleRouteGrant,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({"error": message.into()})))
}

fn policy_error(e: PolicyError) -> ApiError {
    match e {
        PolicyError::InvalidRequest(_) | PolicyError::InvalidAssignment(_) => {
            api_error(StatusCode::BAD_REQUEST, e.to_string())
        }
        PolicyError::StoreUnavailable(_) => {
            error!(error = %e, "Policy store unavailable");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Policy store unavailable")
        }
    }
}

/// Callers administer their own domain; the root role administers all
fn ensure_domain_access(state: &AppState, claims: &WardenClaims, domain: &str) -> Result<(), ApiError> {
    if claims.domain == domain || state.config.is_root(&claims.roles, &claims.domain) {
        return Ok(());
    }
    Err(api_error(
        StatusCode::FORBIDDEN,
        format!("Caller may not administer domain '{}'", domain),
    ))
}

#[derive(Serialize)]
pub struct WhoAmIResponse {
    pub subject: String,
    pub username: String,
    pub domain: String,
    pub roles: Vec<String>,
    /// Routes visible to any of the caller's roles
    pub routes: Vec<String>,
}

pub async fn whoami(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
) -> Result<Json<WhoAmIResponse>, ApiError> {
    let mut routes: Vec<String> = vec![];
    for role in &claims.roles {
        for route in state
            .policy_store
            .routes_for_role(&claims.domain, role)
            .await
            .map_err(policy_error)?
        {
            if !routes.contains(&route) {
                routes.push(route);
            }
        }
    }

    Ok(Json(WhoAmIResponse {
        subject: claims.sub,
        username: claims.username,
        domain: claims.domain,
        roles: claims.roles,
        routes,
    }))
}

#[derive(Deserialize)]
pub struct RuleListQuery {
    pub domain: Option<String>,
    pub role: Option<String>,
}

pub async fn list_rules(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
    Query(query): Query<RuleListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let domain = query.domain.unwrap_or_else(|| claims.domain.clone());
    ensure_domain_access(&state, &claims, &domain)?;

    let rules: Vec<PolicyRule> = state
        .policy_store
        .list_rules(&domain)
        .await
        .map_err(policy_error)?
        .into_iter()
        .filter(|r| query.role.as_deref().map_or(true, |role| r.role == role))
        .collect();
    let total = rules.len();
    Ok(Json(serde_json::json!({
        "domain": domain,
        "rules": rules,
        "total": total,
    })))
}

pub async fn check(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
    Json(req): Json<AuthzCheckRequest>,
) -> Result<Json<AuthzDecision>, ApiError> {
    ensure_domain_access(&state, &claims, &req.domain)?;
    state
        .gate
        .decide(&req.roles, &req.resource, &req.action, &req.domain)
        .await
        .map(Json)
        .map_err(policy_error)
}

#[derive(Deserialize)]
pub struct AssignPermissionsRequest {
    pub domain: String,
    pub role: String,
    /// Endpoint ids from the inventory
    pub permissions: Vec<String>,
}

#[derive(Serialize)]
pub struct AssignPermissionsResponse {
    pub domain: String,
    pub role: String,
    pub rules: usize,
}

pub async fn assign_permissions(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
    Json(req): Json<AssignPermissionsRequest>,
) -> Result<Json<AssignPermissionsResponse>, ApiError> {
    ensure_domain_access(&state, &claims, &req.domain)?;

    let (endpoints, missing) = state
        .endpoints
        .find_many(&req.permissions)
        .await
        .map_err(|e| {
            error!(error = %e, "Endpoint lookup failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Endpoint inventory unavailable")
        })?;
    if !missing.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Unknown endpoints", "missing": missing})),
        ));
    }

    let grants: Vec<PermissionGrant> = endpoints
        .iter()
        .map(|e| e.permission())
        .filter(|p| !p.is_unrestricted())
        .map(|p| PermissionGrant::new(&p.resource, &p.action))
        .collect();

    let rules = state
        .policy_store
        .assign_permissions(&req.domain, &req.role, grants)
        .await
        .map_err(policy_error)?;
    info!(actor = %claims.sub, domain = %req.domain, role = %req.role, rules, "Permissions assigned via API");

    Ok(Json(AssignPermissionsResponse {
        domain: req.domain,
        role: req.role,
        rules,
    }))
}

#[derive(Deserialize)]
pub struct AssignRoutesRequest {
    pub domain: String,
    pub role: String,
    pub route_ids: Vec<String>,
}

pub async fn assign_routes(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
    Json(req): Json<AssignRoutesRequest>,
) -> Result<Json<RoleRouteGrant>, ApiError> {
    ensure_domain_access(&state, &claims, &req.domain)?;
    state
        .policy_store
        .assign_routes(&req.domain, &req.role, req.route_ids)
        .await
        .map(Json)
        .map_err(policy_error)
}

#[derive(Deserialize)]
pub struct AssignUsersRequest {
    pub domain: String,
    pub role: String,
    pub user_ids: Vec<String>,
}

pub async fn assign_users(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
    Json(req): Json<AssignUsersRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    ensure_domain_access(&state, &claims, &req.domain)?;
    let users = state
        .policy_store
        .assign_users(&req.domain, &req.role, req.user_ids)
        .await
        .map_err(policy_error)?;
    info!(actor = %claims.sub, domain = %req.domain, role = %req.role, users, "Users assigned via API");
    Ok(Json(serde_json::json!({
        "domain": req.domain,
        "role": req.role,
        "users": users,
    })))
}

#[derive(Deserialize)]
pub struct MemberQuery {
    pub domain: Option<String>,
    pub role: String,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(claims): Extension<WardenClaims>,
    Query(query): Query<MemberQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let domain = query.domain.unwrap_or_else(|| claims.domain.clone());
    ensure_domain_access(&state, &claims, &domain)?;

    let users = state
        .policy_store
        .users_in_role(&domain, &query.role)
        .await
        .map_err(policy_error)?;
    Ok(Json(serde_json::json!({
        "domain": domain,
        "role": query.role,
        "user_ids": users,
    })))
}
