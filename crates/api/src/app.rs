use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{
        header::{HeaderValue, CONTENT_TYPE},
        Method, StatusCode,
    },
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::gql::{QueryRequest, QueryResponse};
use crate::state::AppState;

/// Path of the query endpoint.
pub const QUERY_PATH: &str = "/lacrosse";

/// Build the Axum router with health endpoint and the query endpoint.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    Router::new()
        // Simple liveness check; also proves store connectivity.
        .route("/health", get(health))
        .route(QUERY_PATH, get(query_get).post(query_post))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE]),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryParams {
    query: Option<String>,
    variables: Option<String>,
    operation_name: Option<String>,
}

/// `GET /lacrosse?query={player(id:"..."){id,number}}`
async fn query_get(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, AppError> {
    let query = params
        .query
        .ok_or_else(|| AppError::BadRequest("Missing `query` parameter".to_string()))?;

    let variables = match params.variables.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            serde_json::from_str::<Map<String, Value>>(raw)
                .map_err(|e| AppError::BadRequest(format!("Invalid variables: {e}")))?,
        ),
    };

    let request = QueryRequest {
        query,
        variables,
        operation_name: params.operation_name,
    };
    Ok(Json(state.executor().execute(request).await))
}

async fn query_post(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    Json(state.executor().execute(request).await)
}

async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.store.ping().await?;
    Ok("ok")
}
