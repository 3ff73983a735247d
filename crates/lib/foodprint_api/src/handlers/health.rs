//! Health endpoint — version and credential store reachability.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = match state.sessions.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("credential store ping failed: {e}");
            false
        }
    };

    Json(HealthResponse {
        version: foodprint_core::version().to_string(),
        store_connected,
    })
}
