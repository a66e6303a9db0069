use crate::error::PolicyError;
use crate::models::AuthzDecision;
use crate::store::PolicyStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Request-time authorization check against the rule store.
///
/// Holds no state of its own; every call reads the store. A store failure is
/// returned as an error and must not be read as a deny.
pub struct PolicyGate {
    store: Arc<dyn PolicyStore>,
}

impl PolicyGate {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// True if any of `roles` holds (resource, action) in `domain`
    pub async fn authorize(
        &self,
        roles: &[String],
        resource: &str,
        action: &str,
        domain: &str,
    ) -> Result<bool, PolicyError> {
        Ok(self.decide(roles, resource, action, domain).await?.allowed)
    }

    pub async fn decide(
        &self,
        roles: &[String],
        resource: &str,
        action: &str,
        domain: &str,
    ) -> Result<AuthzDecision, PolicyError> {
        let start = Instant::now();
        if domain.is_empty() {
            return Err(PolicyError::InvalidRequest("domain is required".to_string()));
        }

        for role in roles {
            let rules = self.store.find_rules(role, domain).await?;
            if let Some(rule) = rules.into_iter().find(|r| r.matches(resource, action, domain)) {
                debug!(role = %role, resource, action, domain, "Granted");
                return Ok(AuthzDecision {
                    allowed: true,
                    matched_role: Some(role.clone()),
                    rule: Some(rule),
                    evaluation_time_us: start.elapsed().as_micros() as u64,
                });
            }
        }

        debug!(roles = ?roles, resource, action, domain, "No matching rule");
        Ok(AuthzDecision {
            allowed: false,
            matched_role: None,
            rule: None,
            evaluation_time_us: start.elapsed().as_micros() as u64,
        })
    }
}
