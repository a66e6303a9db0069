use crate::error::EndpointError;
use crate::identity::compute_id;
use crate::introspect::{HandlerSource, RouteIntrospector};
use crate::models::{EndpointRecord, HandlerDescriptor, PermissionTuple};
use crate::path::join_route;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds the endpoint inventory from the live handler set.
///
/// Runs once per boot, synchronously. Records come out in enumeration order
/// but consumers must key them by `id`.
pub struct EndpointCollector {
    introspector: RouteIntrospector,
}

impl EndpointCollector {
    pub fn new(introspector: RouteIntrospector) -> Self {
        Self { introspector }
    }

    pub fn from_source(source: Arc<dyn HandlerSource>) -> Self {
        Self::new(RouteIntrospector::new(source))
    }

    pub fn collect(&self) -> Vec<EndpointRecord> {
        let handlers = self.introspector.list_handlers();
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for handler in &handlers {
            match records_for(handler) {
                Ok(batch) => {
                    for record in batch {
                        if !seen.insert(record.id.clone()) {
                            // Same tuple registered twice; upsert keeps the later one
                            debug!(
                                id = %record.id,
                                path = %record.path,
                                method = %record.method,
                                "Duplicate endpoint identity"
                            );
                        }
                        records.push(record);
                    }
                }
                Err(e) => warn!(
                    controller = %handler.controller,
                    error = %e,
                    "Skipping handler during endpoint collection"
                ),
            }
        }

        info!(
            handlers = handlers.len(),
            records = records.len(),
            unique = seen.len(),
            "Endpoint collection complete"
        );
        records
    }
}

/// Fan one handler out into one record per declared permission
pub fn records_for(handler: &HandlerDescriptor) -> Result<Vec<EndpointRecord>, EndpointError> {
    let path = join_route(&handler.controller_path, &handler.method_path)?;
    let method = handler.method.as_str();

    let unrestricted = [PermissionTuple::unrestricted()];
    let permissions: &[PermissionTuple] = if handler.permissions.is_empty() {
        &unrestricted[..]
    } else {
        handler.permissions.as_slice()
    };

    Ok(permissions
        .iter()
        .map(|perm| EndpointRecord {
            id: compute_id(&perm.action, &perm.resource, &path, method),
            path: path.clone(),
            method: method.to_string(),
            action: perm.action.clone(),
            resource: perm.resource.clone(),
            controller: handler.controller.clone(),
            summary: handler.summary.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::RouteRegistry;
    use crate::models::RegisteredHandler;

    fn collect(handlers: Vec<RegisteredHandler>) -> Vec<EndpointRecord> {
        EndpointCollector::from_source(Arc::new(RouteRegistry::new(handlers))).collect()
    }

    #[test]
    fn test_single_permission_route() {
        let records = collect(vec![RegisteredHandler::route(
            "UserController",
            "/users",
            "/",
            "GET",
        )
        .with_permission("user:read")]);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.path, "/users");
        assert_eq!(record.method, "GET");
        assert_eq!(record.action, "read");
        assert_eq!(record.resource, "user");
        assert_eq!(record.controller, "UserController");
        assert_eq!(record.id, compute_id("read", "user", "/users", "GET"));
    }

    #[test]
    fn test_route_without_permission_is_still_inventoried() {
        let records = collect(vec![RegisteredHandler::route(
            "AuthController",
            "/auth",
            "/whoami",
            "GET",
        )]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "");
        assert_eq!(records[0].resource, "");
        assert_eq!(records[0].id, compute_id("", "", "/auth/whoami", "GET"));
    }

    #[test]
    fn test_permissions_fan_out() {
        let records = collect(vec![RegisteredHandler::route(
            "RoleController",
            "/roles/",
            "/:id/assign",
            "POST",
        )
        .with_permission("role:update")
        .with_permission("authz:assign-permission")
        .with_permission("authz:assign-user")]);

        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.path == "/roles/:id/assign" && r.method == "POST"));
        let ids: HashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_one_bad_handler_does_not_drop_the_others() {
        let records = collect(vec![
            RegisteredHandler::route("A", "/a", "/", "GET").with_permission("a:read"),
            RegisteredHandler::route("B", "/b", "/", "GET").with_permission("not-a-permission"),
            RegisteredHandler::route("C", "/c", "/", "GET").with_permission("c:read"),
        ]);

        let controllers: Vec<_> = records.iter().map(|r| r.controller.as_str()).collect();
        assert_eq!(controllers, vec!["A", "C"]);
    }

    #[test]
    fn test_bad_path_is_isolated_to_its_handler() {
        let records = collect(vec![
            RegisteredHandler::route("A", "/a", "/", "GET"),
            RegisteredHandler::route("B", "/b", "/search?q", "GET"),
            RegisteredHandler::route("C", "/c", "/", "GET"),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "/a");
        assert_eq!(records[1].path, "/c");
    }

    #[test]
    fn test_duplicate_registrations_share_an_id() {
        let route = RegisteredHandler::route("A", "/a", "/", "GET").with_permission("a:read");
        let records = collect(vec![route.clone(), route]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, records[1].id);
    }
}
