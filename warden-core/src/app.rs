use crate::api::{self, API_PREFIX};
use crate::middleware::require_permission;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Guard every registered route and mount the public ones next to them
pub fn build_app(state: AppState, guarded: Router<AppState>) -> Router {
    let guarded = guarded.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_permission,
    ));

    Router::new()
        .route(&format!("{}/health", API_PREFIX), get(api::health::health_check))
        .merge(guarded)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
