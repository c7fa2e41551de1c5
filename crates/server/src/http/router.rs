use super::handlers::{comments, listings, preferences, session, sse};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

const METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins == "*" {
        return CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        tracing::info!("CORS enabled for origins: {:?}", origins);
        CorsLayer::new()
            .allow_methods(METHODS)
            .allow_origin(origins)
            .allow_headers(Any)
    }
}

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    Router::new()
        .route(
            "/api/session",
            post(session::sign_in).get(session::current_viewer),
        )
        .route(
            "/api/preferences",
            get(preferences::get_preferences).put(preferences::update_preferences),
        )
        .route("/api/listings/resolve", post(listings::resolve_listing))
        .route("/api/listings/:listing_id", get(listings::get_listing))
        .route(
            "/api/listings/:listing_id/comments",
            get(comments::list_comments).post(comments::post_comment),
        )
        .route(
            "/api/listings/:listing_id/records",
            get(comments::list_records),
        )
        .route(
            "/api/listings/:listing_id/comments/:comment_id",
            axum::routing::delete(comments::delete_comment),
        )
        .route(
            "/api/listings/:listing_id/comments/:comment_id/like",
            post(comments::like_comment),
        )
        .route("/api/listings/:listing_id/sse", get(sse::sse_handler))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}
