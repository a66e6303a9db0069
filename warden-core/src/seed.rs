use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use warden_endpoint::{EndpointError, EndpointRecord, EndpointSubscriber};
use warden_policy::{PolicyAdmin, PolicyRule};

/// Grants the root role every permissioned endpoint in the built-in domain
/// once the inventory is published.
pub struct PolicySeeder {
    admin: Arc<dyn PolicyAdmin>,
    domain: String,
    role: String,
}

impl PolicySeeder {
    pub fn new(admin: Arc<dyn PolicyAdmin>, domain: &str, role: &str) -> Self {
        Self {
            admin,
            domain: domain.to_string(),
            role: role.to_string(),
        }
    }

    fn rules_for(&self, records: &[EndpointRecord]) -> Vec<PolicyRule> {
        let mut rules: Vec<PolicyRule> = vec![];
        for record in records.iter().filter(|r| !r.permission().is_unrestricted()) {
            let rule = PolicyRule::new(&self.role, &record.resource, &record.action, &self.domain);
            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }
        rules
    }
}

#[async_trait]
impl EndpointSubscriber for PolicySeeder {
    async fn save(&self, records: &[EndpointRecord]) -> Result<(), EndpointError> {
        let rules = self.rules_for(records);
        let total = rules.len();
        let added = self
            .admin
            .add_rules(rules)
            .await
            .map_err(|e| EndpointError::Delivery(e.to_string()))?;
        info!(
            role = %self.role,
            domain = %self.domain,
            rules = total,
            added,
            "Root role seeded from endpoint inventory"
        );
        Ok(())
    }
}
