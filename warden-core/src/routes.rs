//! Route registration that records handler metadata alongside the axum route.
//!
//! Every handler mounted through [`Registrar`] lands in the [`RouteRegistry`]
//! the endpoint collector reads at boot, so the inventory can't drift from
//! what the router actually serves.

use crate::state::AppState;
use axum::handler::Handler;
use axum::routing::{on, MethodFilter};
use axum::Router;
use warden_endpoint::path::normalize_path;
use warden_endpoint::{HttpMethod, RegisteredHandler, RouteRegistry};

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Options => MethodFilter::OPTIONS,
    }
}

pub struct ControllerRoutes {
    controller: String,
    base: String,
    router: Router<AppState>,
    handlers: Vec<RegisteredHandler>,
}

impl ControllerRoutes {
    fn new(controller: &str, base: &str) -> Self {
        Self {
            controller: controller.to_string(),
            base: base.to_string(),
            router: Router::new(),
            handlers: vec![],
        }
    }

    /// Mount `handler` and record it. `permissions` use the `resource:action`
    /// form; an empty slice means authenticated-only.
    pub fn route<H, T>(
        mut self,
        method: HttpMethod,
        path: &str,
        permissions: &[&str],
        summary: &str,
        handler: H,
    ) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let full_path = normalize_path(&format!("{}/{}", self.base, path));
        self.router = self
            .router
            .route(&full_path, on(method_filter(method), handler));

        let mut entry = RegisteredHandler::route(&self.controller, &self.base, path, method.as_str())
            .with_summary(summary);
        for permission in permissions {
            entry = entry.with_permission(permission);
        }
        self.handlers.push(entry);
        self
    }

    pub fn get<H, T>(self, path: &str, permissions: &[&str], summary: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(HttpMethod::Get, path, permissions, summary, handler)
    }

    pub fn post<H, T>(self, path: &str, permissions: &[&str], summary: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(HttpMethod::Post, path, permissions, summary, handler)
    }
}

pub struct Registrar {
    prefix: String,
    router: Router<AppState>,
    handlers: Vec<RegisteredHandler>,
}

impl Registrar {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            router: Router::new(),
            handlers: vec![],
        }
    }

    pub fn controller(
        mut self,
        name: &str,
        base: &str,
        build: impl FnOnce(ControllerRoutes) -> ControllerRoutes,
    ) -> Self {
        let controller_path = format!("{}/{}", self.prefix, base);
        let routes = build(ControllerRoutes::new(name, &controller_path));
        self.router = self.router.merge(routes.router);
        self.handlers.extend(routes.handlers);
        self
    }

    /// Freeze the registration table. Nothing can be registered afterwards.
    pub fn finish(self) -> (Router<AppState>, RouteRegistry) {
        (self.router, RouteRegistry::new(self.handlers))
    }
}
