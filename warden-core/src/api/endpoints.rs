use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use warden_endpoint::{EndpointError, EndpointRecord};

type ApiError = (StatusCode, Json<serde_json::Value>);

fn storage_error(e: EndpointError) -> ApiError {
    tracing::error!(error = %e, "Endpoint inventory query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
}

#[derive(Deserialize)]
pub struct EndpointListQuery {
    pub controller: Option<String>,
}

pub async fn list_endpoints(
    State(state): State<AppState>,
    Query(query): Query<EndpointListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let endpoints = state
        .endpoints
        .list(query.controller.as_deref())
        .await
        .map_err(storage_error)?;
    let total = endpoints.len();
    Ok(Json(serde_json::json!({
        "endpoints": endpoints,
        "total": total,
    })))
}

#[derive(Serialize)]
pub struct ControllerNode {
    pub controller: String,
    pub endpoints: Vec<EndpointRecord>,
}

pub async fn endpoint_tree(State(state): State<AppState>) -> Result<Json<Vec<ControllerNode>>, ApiError> {
    let endpoints = state.endpoints.list(None).await.map_err(storage_error)?;

    let mut groups: BTreeMap<String, Vec<EndpointRecord>> = BTreeMap::new();
    for endpoint in endpoints {
        groups
            .entry(endpoint.controller.clone())
            .or_default()
            .push(endpoint);
    }

    Ok(Json(
        groups
            .into_iter()
            .map(|(controller, endpoints)| ControllerNode {
                controller,
                endpoints,
            })
            .collect(),
    ))
}

pub async fn get_endpoint(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EndpointRecord>, ApiError> {
    state
        .endpoints
        .find(&id)
        .await
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Endpoint not found"})),
            )
        })
}
