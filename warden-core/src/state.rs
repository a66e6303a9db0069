use crate::config::AppConfig;
use crate::middleware::RouteGuards;
use crate::repository::EndpointRepository;
use crate::seed::PolicySeeder;
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;
use warden_endpoint::{EndpointCollector, EndpointPublisher, PublishReport, RouteRegistry};
use warden_identity::jwt::JwtService;
use warden_identity::AuthzAuditEvent;
use warden_policy::{MemoryPolicyStore, PolicyGate};

const AUDIT_LOG_CAPACITY: usize = 10_000;

/// Shared application state, injected into all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub policy_store: Arc<MemoryPolicyStore>,
    pub gate: Arc<PolicyGate>,
    pub jwt_service: Arc<JwtService>,
    pub endpoints: Arc<EndpointRepository>,
    pub publisher: Arc<EndpointPublisher>,
    pub route_guards: Arc<RouteGuards>,
    pub audit_log: Arc<RwLock<VecDeque<AuthzAuditEvent>>>,
}

impl AppState {
    pub async fn new(config: AppConfig, registry: &RouteRegistry) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, &config.jwt_issuer));

        let policy_store = Arc::new(MemoryPolicyStore::new());
        let gate = Arc::new(PolicyGate::new(policy_store.clone()));

        let endpoints = Arc::new(EndpointRepository::connect(&config.database_url).await?);
        let route_guards = Arc::new(RouteGuards::from_registry(registry));

        info!(routes = registry.len(), "AppState initialized");

        Ok(Self {
            config,
            policy_store,
            gate,
            jwt_service,
            endpoints,
            publisher: Arc::new(EndpointPublisher::new()),
            route_guards,
            audit_log: Arc::new(RwLock::new(VecDeque::with_capacity(AUDIT_LOG_CAPACITY))),
        })
    }

    pub async fn record_audit(&self, event: AuthzAuditEvent) {
        let mut log = self.audit_log.write().await;
        if log.len() >= AUDIT_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(event);
    }

    /// Signal that every module is initialized: subscribe the inventory
    /// consumers and publish on a separate task so boot is not held up.
    pub async fn publish_inventory(&self, registry: RouteRegistry) -> JoinHandle<PublishReport> {
        self.publisher
            .subscribe("endpoint-repository", self.endpoints.clone())
            .await;

        let collector = EndpointCollector::from_source(Arc::new(registry));
        let publisher = Arc::clone(&self.publisher);
        let handle = tokio::spawn(async move { publisher.start(&collector).await });

        // May land before or after publication; either way it is delivered once
        self.publisher
            .subscribe(
                "policy-seeder",
                Arc::new(PolicySeeder::new(
                    self.policy_store.clone(),
                    &self.config.default_domain,
                    &self.config.root_role,
                )),
            )
            .await;
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_identity::AuditDecision;

    #[tokio::test]
    async fn test_audit_log_drops_oldest_at_capacity() {
        let config = AppConfig::from_builder(config::Config::builder()).unwrap();
        let state = AppState::new(config, &RouteRegistry::default()).await.unwrap();

        for i in 0..=AUDIT_LOG_CAPACITY {
            let event = AuthzAuditEvent::new(&format!("user-{}", i), "built-in", "GET", "/x", AuditDecision::Allow);
            state.record_audit(event).await;
        }

        let log = state.audit_log.read().await;
        assert_eq!(log.len(), AUDIT_LOG_CAPACITY);
        assert_eq!(log.front().unwrap().subject, "user-1");
        assert_eq!(log.back().unwrap().subject, format!("user-{}", AUDIT_LOG_CAPACITY));
    }
}
