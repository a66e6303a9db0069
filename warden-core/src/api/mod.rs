pub mod audit;
pub mod authz;
pub mod endpoints;
pub mod health;

use crate::routes::Registrar;

pub const API_PREFIX: &str = "/api/v1";

/// Every guarded route of the service. Health is mounted separately and is
/// public.
pub fn registrar() -> Registrar {
    Registrar::new(API_PREFIX)
        // Endpoint inventory
        .controller("EndpointController", "/endpoints", |c| {
            c.get("/", &["endpoint:read"], "List endpoints", endpoints::list_endpoints)
                .get("/tree", &["endpoint:read"], "Endpoints grouped by controller", endpoints::endpoint_tree)
                .get("/:id", &["endpoint:read"], "Get endpoint", endpoints::get_endpoint)
        })
        // Policy assignment and checks
        .controller("AuthzController", "/authz", |c| {
            c.get("/whoami", &[], "Current caller", authz::whoami)
                .get("/rules", &["authz:read"], "List policy rules", authz::list_rules)
                .get("/members", &["authz:read"], "List members of a role", authz::list_members)
                .post("/check", &["authz:read"], "Evaluate a decision", authz::check)
                .post(
                    "/assign-permissions",
                    &["authz:assign-permission"],
                    "Assign endpoint permissions to a role",
                    authz::assign_permissions,
                )
                .post(
                    "/assign-routes",
                    &["authz:assign-route"],
                    "Assign routes to a role",
                    authz::assign_routes,
                )
                .post(
                    "/assign-users",
                    &["authz:assign-user"],
                    "Assign users to a role",
                    authz::assign_users,
                )
        })
        // Audit log
        .controller("AuditController", "/audit", |c| {
            c.get("/", &["audit:read"], "Recent authorization events", audit::list_audit_events)
                .get("/stats", &["audit:read"], "Decision counters", audit::audit_stats)
        })
}
