use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use warden_endpoint::PublisherPhase;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    /// Where boot-time endpoint publication stands
    pub inventory: PublisherPhase,
    /// Published record count, absent until publication
    pub endpoints: Option<usize>,
    pub timestamp: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "Warden",
        version: env!("CARGO_PKG_VERSION"),
        inventory: state.publisher.phase().await,
        endpoints: state.publisher.watch().borrow().as_ref().map(|i| i.len()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
