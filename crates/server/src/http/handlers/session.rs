use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::Viewer;
use serde::{Deserialize, Serialize};

use super::{internal, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    pub display_name: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub viewer: Viewer,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let name = payload.display_name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Display name must be 1-64 characters".to_string(),
        ));
    }
    let (token, viewer) = state.identity.issue(name).map_err(internal)?;
    tracing::info!("Viewer signed in: {}", viewer.id);
    Ok(Json(SignInResponse { token, viewer }))
}

pub async fn current_viewer(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Viewer>, ApiError> {
    state
        .viewer(&headers)
        .map(Json)
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))
}
