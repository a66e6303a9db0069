use crate::error::PolicyError;
use crate::models::{PermissionGrant, PolicyRule, RoleRouteGrant};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Read side of the rule store, used on every gated request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn find_rules(&self, role: &str, domain: &str) -> Result<Vec<PolicyRule>, PolicyError>;
}

/// Write side, used by admin tooling and boot-time seeding
#[async_trait]
pub trait PolicyAdmin: Send + Sync {
    /// Replace every rule of `role` in `domain`. Returns the number of rules kept.
    async fn assign_permissions(
        &self,
        domain: &str,
        role: &str,
        grants: Vec<PermissionGrant>,
    ) -> Result<usize, PolicyError>;

    /// Replace the routes visible to `role` in `domain`
    async fn assign_routes(
        &self,
        domain: &str,
        role: &str,
        route_ids: Vec<String>,
    ) -> Result<RoleRouteGrant, PolicyError>;

    /// Replace the members of `role` in `domain`
    async fn assign_users(
        &self,
        domain: &str,
        role: &str,
        user_ids: Vec<String>,
    ) -> Result<usize, PolicyError>;

    /// Add rules, skipping ones already present. Returns how many were new.
    async fn add_rules(&self, rules: Vec<PolicyRule>) -> Result<usize, PolicyError>;

    async fn list_rules(&self, domain: &str) -> Result<Vec<PolicyRule>, PolicyError>;

    async fn routes_for_role(&self, domain: &str, role: &str) -> Result<Vec<String>, PolicyError>;

    async fn users_in_role(&self, domain: &str, role: &str) -> Result<Vec<String>, PolicyError>;
}

#[derive(Default)]
struct PolicyTables {
    rules: Vec<PolicyRule>,
    routes: HashMap<(String, String), Vec<String>>,
    members: HashMap<(String, String), Vec<String>>,
}

/// In-memory rule store
pub struct MemoryPolicyStore {
    tables: Arc<RwLock<PolicyTables>>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(PolicyTables::default())),
        }
    }
}

impl Default for MemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

fn require(field: &str, value: &str) -> Result<(), PolicyError> {
    if value.trim().is_empty() {
        return Err(PolicyError::InvalidAssignment(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn find_rules(&self, role: &str, domain: &str) -> Result<Vec<PolicyRule>, PolicyError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rules
            .iter()
            .filter(|r| r.role == role && r.domain == domain)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PolicyAdmin for MemoryPolicyStore {
    async fn assign_permissions(
        &self,
        domain: &str,
        role: &str,
        grants: Vec<PermissionGrant>,
    ) -> Result<usize, PolicyError> {
        require("domain", domain)?;
        require("role", role)?;

        let mut fresh: Vec<PolicyRule> = Vec::with_capacity(grants.len());
        for grant in grants {
            let rule = PolicyRule::new(role, &grant.resource, &grant.action, domain);
            if !fresh.contains(&rule) {
                fresh.push(rule);
            }
        }
        let kept = fresh.len();

        let mut tables = self.tables.write().await;
        tables.rules.retain(|r| !(r.role == role && r.domain == domain));
        tables.rules.extend(fresh);
        info!(domain, role, rules = kept, "Permissions assigned");
        Ok(kept)
    }

    async fn assign_routes(
        &self,
        domain: &str,
        role: &str,
        route_ids: Vec<String>,
    ) -> Result<RoleRouteGrant, PolicyError> {
        require("domain", domain)?;
        require("role", role)?;

        let route_ids = dedup_ids(route_ids);
        let mut tables = self.tables.write().await;
        tables
            .routes
            .insert((domain.to_string(), role.to_string()), route_ids.clone());
        info!(domain, role, routes = route_ids.len(), "Routes assigned");
        Ok(RoleRouteGrant {
            domain: domain.to_string(),
            role: role.to_string(),
            route_ids,
        })
    }

    async fn assign_users(
        &self,
        domain: &str,
        role: &str,
        user_ids: Vec<String>,
    ) -> Result<usize, PolicyError> {
        require("domain", domain)?;
        require("role", role)?;

        let user_ids = dedup_ids(user_ids);
        let count = user_ids.len();
        let mut tables = self.tables.write().await;
        tables
            .members
            .insert((domain.to_string(), role.to_string()), user_ids);
        info!(domain, role, users = count, "Users assigned");
        Ok(count)
    }

    async fn add_rules(&self, rules: Vec<PolicyRule>) -> Result<usize, PolicyError> {
        let mut tables = self.tables.write().await;
        let mut added = 0;
        for rule in rules {
            if !tables.rules.contains(&rule) {
                tables.rules.push(rule);
                added += 1;
            }
        }
        Ok(added)
    }

    async fn list_rules(&self, domain: &str) -> Result<Vec<PolicyRule>, PolicyError> {
        let tables = self.tables.read().await;
        Ok(tables
            .rules
            .iter()
            .filter(|r| r.domain == domain)
            .cloned()
            .collect())
    }

    async fn routes_for_role(&self, domain: &str, role: &str) -> Result<Vec<String>, PolicyError> {
        let tables = self.tables.read().await;
        Ok(tables
            .routes
            .get(&(domain.to_string(), role.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn users_in_role(&self, domain: &str, role: &str) -> Result<Vec<String>, PolicyError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .get(&(domain.to_string(), role.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_assign_permissions_replaces_previous_rules() {
        let store = MemoryPolicyStore::new();
        store
            .assign_permissions(
                "tenant-a",
                "editor",
                vec![
                    PermissionGrant::new("user", "read"),
                    PermissionGrant::new("user", "update"),
                ],
            )
            .await
            .unwrap();

        let kept = store
            .assign_permissions(
                "tenant-a",
                "editor",
                vec![
                    PermissionGrant::new("role", "read"),
                    PermissionGrant::new("role", "read"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(kept, 1);
        let rules = store.find_rules("editor", "tenant-a").await.unwrap();
        assert_eq!(rules, vec![PolicyRule::new("editor", "role", "read", "tenant-a")]);
    }

    #[tokio::test]
    async fn test_assignment_is_scoped_to_domain() {
        let store = MemoryPolicyStore::new();
        store
            .assign_permissions("tenant-a", "admin", vec![PermissionGrant::new("user", "read")])
            .await
            .unwrap();
        store
            .assign_permissions("tenant-b", "admin", vec![])
            .await
            .unwrap();

        assert_eq!(store.find_rules("admin", "tenant-a").await.unwrap().len(), 1);
        assert!(store.find_rules("admin", "tenant-b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_role_is_rejected() {
        let store = MemoryPolicyStore::new();
        let err = store
            .assign_users("tenant-a", " ", vec!["u1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidAssignment(_)));
    }

    #[tokio::test]
    async fn test_routes_and_members() {
        let store = MemoryPolicyStore::new();
        let grant = store
            .assign_routes(
                "tenant-a",
                "viewer",
                vec!["dashboard".to_string(), "audit".to_string(), "dashboard".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(grant.route_ids, vec!["dashboard", "audit"]);
        assert_eq!(
            store.routes_for_role("tenant-a", "viewer").await.unwrap(),
            vec!["dashboard", "audit"]
        );
        assert!(store.routes_for_role("tenant-b", "viewer").await.unwrap().is_empty());

        store
            .assign_users("tenant-a", "viewer", vec!["u1".to_string(), "u2".to_string()])
            .await
            .unwrap();
        store
            .assign_users("tenant-a", "viewer", vec!["u3".to_string()])
            .await
            .unwrap();
        assert_eq!(store.users_in_role("tenant-a", "viewer").await.unwrap(), vec!["u3"]);
    }

    #[tokio::test]
    async fn test_members_are_scoped_to_domain() {
        let store = MemoryPolicyStore::new();
        store
            .assign_users("tenant-b", "viewer", vec!["b-user".to_string()])
            .await
            .unwrap();
        store.assign_users("tenant-a", "viewer", vec![]).await.unwrap();

        assert_eq!(store.users_in_role("tenant-b", "viewer").await.unwrap(), vec!["b-user"]);
        assert!(store.users_in_role("tenant-a", "viewer").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rules_skips_existing() {
        let store = MemoryPolicyStore::new();
        let rule = PolicyRule::new("ROLE_SUPER", "endpoint", "read", "built-in");
        assert_eq!(store.add_rules(vec![rule.clone()]).await.unwrap(), 1);
        assert_eq!(store.add_rules(vec![rule]).await.unwrap(), 0);
        assert_eq!(store.list_rules("built-in").await.unwrap().len(), 1);
    }
}
