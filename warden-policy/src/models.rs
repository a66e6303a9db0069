use serde::{Deserialize, Serialize};

/// A (role, resource, action, domain) grant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PolicyRule {
    pub role: String,
    pub resource: String,
    pub action: String,
    /// Tenant the grant is scoped to
    pub domain: String,
}

impl PolicyRule {
    pub fn new(role: &str, resource: &str, action: &str, domain: &str) -> Self {
        Self {
            role: role.to_string(),
            resource: resource.to_string(),
            action: action.to_string(),
            domain: domain.to_string(),
        }
    }

    pub fn matches(&self, resource: &str, action: &str, domain: &str) -> bool {
        self.domain == domain && self.resource == resource && self.action == action
    }
}

/// The (resource, action) half of a rule, before it is bound to a role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PermissionGrant {
    pub resource: String,
    pub action: String,
}

impl PermissionGrant {
    pub fn new(resource: &str, action: &str) -> Self {
        Self {
            resource: resource.to_string(),
            action: action.to_string(),
        }
    }
}

/// Menu/route visibility granted to a role inside one domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRouteGrant {
    pub domain: String,
    pub role: String,
    pub route_ids: Vec<String>,
}

/// Outcome of a gate check
#[derive(Debug, Clone, Serialize)]
pub struct AuthzDecision {
    pub allowed: bool,
    /// First role that granted access
    pub matched_role: Option<String>,
    pub rule: Option<PolicyRule>,
    pub evaluation_time_us: u64,
}

/// Ad-hoc decision request (admin "check" tooling)
#[derive(Debug, Deserialize)]
pub struct AuthzCheckRequest {
    pub roles: Vec<String>,
    pub resource: String,
    pub action: String,
    pub domain: String,
}
