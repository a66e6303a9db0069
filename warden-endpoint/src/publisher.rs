use crate::collector::EndpointCollector;
use crate::error::EndpointError;
use crate::models::EndpointRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

pub type Inventory = Arc<Vec<EndpointRecord>>;

/// Downstream consumer of the endpoint inventory (persistence, policy seeding).
/// `save` must be idempotent: records are upserted by `id`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EndpointSubscriber: Send + Sync {
    async fn save(&self, records: &[EndpointRecord]) -> Result<(), EndpointError>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PublisherPhase {
    Idle,
    Collecting,
    Published,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
    pub records: usize,
    pub delivered: Vec<String>,
    pub failed: Vec<String>,
}

struct Registration {
    name: String,
    subscriber: Arc<dyn EndpointSubscriber>,
}

struct PublisherState {
    phase: PublisherPhase,
    inventory: Option<Inventory>,
    pending: Vec<Registration>,
}

/// Delivers the boot-time inventory to every subscriber exactly once.
///
/// The inventory is buffered after collection. Subscribers registered before
/// publication are delivered to by `start`; subscribers registering later get
/// the buffered inventory from `subscribe` itself. The state lock is held
/// across the phase change, so each subscriber lands on exactly one of the two
/// paths.
pub struct EndpointPublisher {
    state: Mutex<PublisherState>,
    broadcast: watch::Sender<Option<Inventory>>,
}

impl EndpointPublisher {
    pub fn new() -> Self {
        let (broadcast, _) = watch::channel(None);
        Self {
            state: Mutex::new(PublisherState {
                phase: PublisherPhase::Idle,
                inventory: None,
                pending: vec![],
            }),
            broadcast,
        }
    }

    pub async fn phase(&self) -> PublisherPhase {
        self.state.lock().await.phase
    }

    /// Observe publication without taking part in delivery
    pub fn watch(&self) -> watch::Receiver<Option<Inventory>> {
        self.broadcast.subscribe()
    }

    pub async fn subscribe(&self, name: impl Into<String>, subscriber: Arc<dyn EndpointSubscriber>) {
        let name = name.into();
        let mut state = self.state.lock().await;
        let published = state.inventory.clone();
        match published {
            Some(inventory) => {
                drop(state);
                info!(subscriber = %name, "Late subscriber, replaying endpoint inventory");
                // Failure is already logged by deliver
                let _ = deliver(&name, subscriber.as_ref(), &inventory).await;
            }
            None => state.pending.push(Registration { name, subscriber }),
        }
    }

    /// Host signal that all modules are initialized.
    ///
    /// Collects the inventory, yields once so subscribers still finishing
    /// their own setup can register, then publishes. Only the first call
    /// does anything.
    pub async fn start(&self, collector: &EndpointCollector) -> PublishReport {
        {
            let mut state = self.state.lock().await;
            if state.phase != PublisherPhase::Idle {
                warn!(phase = ?state.phase, "Endpoint publisher already started, ignoring");
                return PublishReport::default();
            }
            state.phase = PublisherPhase::Collecting;
        }

        let records = collector.collect();
        tokio::task::yield_now().await;

        let (inventory, pending) = {
            let mut state = self.state.lock().await;
            let inventory: Inventory = Arc::new(records);
            state.inventory = Some(Arc::clone(&inventory));
            state.phase = PublisherPhase::Published;
            (inventory, std::mem::take(&mut state.pending))
        };
        self.broadcast.send_replace(Some(Arc::clone(&inventory)));
        info!(
            records = inventory.len(),
            subscribers = pending.len(),
            "Endpoint inventory published"
        );

        let mut report = PublishReport {
            records: inventory.len(),
            ..Default::default()
        };
        for registration in pending {
            match deliver(&registration.name, registration.subscriber.as_ref(), &inventory).await {
                Ok(()) => report.delivered.push(registration.name),
                Err(_) => report.failed.push(registration.name),
            }
        }
        report
    }
}

impl Default for EndpointPublisher {
    fn default() -> Self {
        Self::new()
    }
}

async fn deliver(
    name: &str,
    subscriber: &dyn EndpointSubscriber,
    records: &[EndpointRecord],
) -> Result<(), EndpointError> {
    match subscriber.save(records).await {
        Ok(()) => {
            info!(subscriber = %name, records = records.len(), "Endpoint inventory delivered");
            Ok(())
        }
        Err(e) => {
            error!(
                subscriber = %name,
                records = records.len(),
                error = %e,
                "Endpoint inventory delivery failed"
            );
            Err(e)
        }
    }
}
