use crate::error::EndpointError;
use crate::models::{HandlerDescriptor, HttpMethod, PermissionTuple, RegisteredHandler};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Supplies the handler registration table of the running service
pub trait HandlerSource: Send + Sync {
    fn registered_handlers(&self) -> Vec<RegisteredHandler>;
}

/// Frozen snapshot of every handler registered while the router was built.
/// Immutable once constructed, so readers need no locking.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    handlers: Arc<Vec<RegisteredHandler>>,
}

impl RouteRegistry {
    pub fn new(handlers: Vec<RegisteredHandler>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl HandlerSource for RouteRegistry {
    fn registered_handlers(&self) -> Vec<RegisteredHandler> {
        self.handlers.as_ref().clone()
    }
}

pub struct RouteIntrospector {
    source: Arc<dyn HandlerSource>,
}

impl RouteIntrospector {
    pub fn new(source: Arc<dyn HandlerSource>) -> Self {
        Self { source }
    }

    /// Enumerate every HTTP handler exactly once.
    ///
    /// Helpers without a verb are skipped silently. Handlers whose metadata
    /// cannot be read are logged and skipped; enumeration never aborts.
    pub fn list_handlers(&self) -> Vec<HandlerDescriptor> {
        let entries = self.source.registered_handlers();
        let mut descriptors = Vec::with_capacity(entries.len());
        let mut failed = 0usize;

        for entry in &entries {
            match describe(entry) {
                Ok(Some(descriptor)) => descriptors.push(descriptor),
                Ok(None) => debug!(
                    controller = %entry.controller,
                    "Skipping handler without HTTP verb"
                ),
                Err(e) => {
                    failed += 1;
                    warn!(
                        controller = %entry.controller,
                        path = %entry.method_path,
                        error = %e,
                        "Handler introspection failed, skipping"
                    );
                }
            }
        }

        info!(
            registered = entries.len(),
            routes = descriptors.len(),
            failed,
            "Route introspection complete"
        );
        descriptors
    }
}

/// Validate one registration entry. `Ok(None)` means it is not an HTTP route.
pub fn describe(entry: &RegisteredHandler) -> Result<Option<HandlerDescriptor>, EndpointError> {
    let Some(verb) = entry.verb.as_deref() else {
        return Ok(None);
    };
    let method: HttpMethod = verb.parse()?;
    let permissions = entry
        .permissions
        .iter()
        .map(|decl| PermissionTuple::parse(decl))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(HandlerDescriptor {
        controller: entry.controller.clone(),
        controller_path: entry.controller_path.clone(),
        method_path: entry.method_path.clone(),
        method,
        permissions,
        summary: entry.summary.clone(),
    }))
}
