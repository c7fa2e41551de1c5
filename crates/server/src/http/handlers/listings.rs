use axum::{
    extract::{Path, State},
    Json,
};
use domain::ListingInfo;
use serde::Deserialize;
use storage::Db;

use super::{internal, parse_listing_id, ApiError};

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub url: String,
    pub heading: Option<String>,
    #[serde(default)]
    pub document_title: String,
}

/// What the page agent would answer for this page; known listings are
/// remembered with their title.
pub async fn resolve_listing(
    State(db): State<Db>,
    Json(payload): Json<ResolveRequest>,
) -> Result<Json<ListingInfo>, ApiError> {
    let info = ListingInfo::from_page(
        &payload.url,
        payload.heading.as_deref(),
        &payload.document_title,
    );
    if let Some(id) = &info.id {
        db.ensure_listing(id.as_str(), &info.title)
            .await
            .map_err(internal)?;
    }
    Ok(Json(info))
}

pub async fn get_listing(
    State(db): State<Db>,
    Path(listing_id): Path<String>,
) -> Result<Json<ListingInfo>, ApiError> {
    let id = parse_listing_id(listing_id)?;
    let info = db
        .get_listing(id.as_str())
        .await
        .map_err(internal)?
        .unwrap_or(ListingInfo {
            id: Some(id),
            title: String::new(),
        });
    Ok(Json(info))
}
