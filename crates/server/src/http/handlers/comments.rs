use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use adapter::{CommandEnvelope, CommandReply};
use domain::{thread, AppCommand, CommentNode, CommentRecord, LikeDelta, ListingId, Topic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::sync::oneshot;

use super::{board_error, internal, parse_listing_id, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
    #[serde(default)]
    pub topics: BTreeSet<Topic>,
    pub parent_id: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Deserialize)]
pub struct LikeRequest {
    pub liked: bool,
}

#[derive(Serialize)]
pub struct BoardResponse {
    pub listing_id: ListingId,
    pub title: String,
    pub total: usize,
    pub comments: Vec<CommentNode>,
}

async fn dispatch(state: &AppState, cmd: AppCommand) -> Result<CommandReply, ApiError> {
    let (tx, rx) = oneshot::channel();
    let envelope = CommandEnvelope { cmd, resp: tx };

    state.sender.send(envelope).await.map_err(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, "Worker closed".to_string())
    })?;

    match tokio::time::timeout(std::time::Duration::from_secs(5), rx).await {
        Ok(Ok(result)) => result.map_err(board_error),
        Ok(Err(_)) => Err((StatusCode::INTERNAL_SERVER_ERROR, "Worker dropped the command".into())),
        Err(_) => Err((StatusCode::GATEWAY_TIMEOUT, "Timeout".into())),
    }
}

/// The assembled thread of one listing.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> Result<Json<BoardResponse>, ApiError> {
    let listing_id = parse_listing_id(listing_id)?;

    let records = state
        .store
        .fetch_by_listing(&listing_id)
        .await
        .map_err(board_error)?;
    let assembly = thread::assemble(records);
    if !assembly.orphans.is_empty() {
        tracing::debug!(
            "Listing {}: {} orphaned comment(s) hidden",
            listing_id,
            assembly.orphans.len()
        );
    }

    let title = state
        .db
        .get_listing(listing_id.as_str())
        .await
        .map_err(internal)?
        .map(|l| l.title)
        .unwrap_or_default();

    Ok(Json(BoardResponse {
        listing_id,
        title,
        total: thread::count_nodes(&assembly.forest),
        comments: assembly.forest,
    }))
}

/// Flat records, for clients that assemble the thread themselves.
pub async fn list_records(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> Result<Json<Vec<CommentRecord>>, ApiError> {
    let listing_id = parse_listing_id(listing_id)?;
    let records = state
        .store
        .fetch_by_listing(&listing_id)
        .await
        .map_err(board_error)?;
    Ok(Json(records))
}

pub async fn post_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(listing_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<CommentRecord>, ApiError> {
    let listing_id = parse_listing_id(listing_id)?;
    let viewer = state.viewer(&headers);

    let nickname = match (payload.nickname, &viewer) {
        (Some(n), _) if !n.trim().is_empty() => n,
        (_, Some(v)) => state
            .db
            .get_preferences(&v.id, state.default_language)
            .await
            .map_err(internal)?
            .nickname,
        _ => String::new(),
    };

    let cmd = AppCommand::PostComment {
        listing_id,
        viewer,
        nickname,
        text: payload.text,
        topics: payload.topics,
        parent_id: payload.parent_id,
    };

    match dispatch(&state, cmd).await? {
        CommandReply::Saved(record) => Ok(Json(record)),
        other => Err(internal(anyhow::anyhow!("Unexpected reply: {:?}", other))),
    }
}

pub async fn like_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((listing_id, comment_id)): Path<(String, String)>,
    Json(payload): Json<LikeRequest>,
) -> Result<Json<LikeDelta>, ApiError> {
    let cmd = AppCommand::ToggleLike {
        listing_id: parse_listing_id(listing_id)?,
        viewer: state.viewer(&headers),
        comment_id,
        liked: payload.liked,
    };

    match dispatch(&state, cmd).await? {
        CommandReply::Liked(delta) => Ok(Json(delta)),
        other => Err(internal(anyhow::anyhow!("Unexpected reply: {:?}", other))),
    }
}

pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((listing_id, comment_id)): Path<(String, String)>,
) -> Result<Json<&'static str>, ApiError> {
    let cmd = AppCommand::DeleteComment {
        listing_id: parse_listing_id(listing_id)?,
        viewer: state.viewer(&headers),
        comment_id,
    };

    match dispatch(&state, cmd).await? {
        CommandReply::Deleted { .. } => Ok(Json("Deleted")),
        other => Err(internal(anyhow::anyhow!("Unexpected reply: {:?}", other))),
    }
}
