use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use domain::{Language, Preferences};
use serde::Deserialize;

use super::{internal, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdatePreferences {
    pub nickname: Option<String>,
    pub language: Option<Language>,
}

pub async fn get_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Preferences>, ApiError> {
    let viewer = state
        .viewer(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;
    let prefs = state
        .db
        .get_preferences(&viewer.id, state.default_language)
        .await
        .map_err(internal)?;
    Ok(Json(prefs))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePreferences>,
) -> Result<Json<Preferences>, ApiError> {
    let viewer = state
        .viewer(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Not signed in".to_string()))?;
    let mut prefs = state
        .db
        .get_preferences(&viewer.id, state.default_language)
        .await
        .map_err(internal)?;
    if let Some(nickname) = payload.nickname {
        prefs.set_nickname(&nickname);
    }
    if let Some(language) = payload.language {
        prefs.language = language;
    }
    state
        .db
        .save_preferences(&viewer.id, &prefs)
        .await
        .map_err(internal)?;
    Ok(Json(prefs))
}
