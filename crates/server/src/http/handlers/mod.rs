pub mod comments;
pub mod listings;
pub mod preferences;
pub mod session;
pub mod sse;

use axum::http::StatusCode;
use domain::{BoardError, ListingId};

pub type ApiError = (StatusCode, String);

pub fn board_error(e: BoardError) -> ApiError {
    let status = match e {
        BoardError::ListingNotFound | BoardError::CommentNotFound(_) => StatusCode::NOT_FOUND,
        BoardError::Unauthenticated => StatusCode::UNAUTHORIZED,
        BoardError::Forbidden => StatusCode::FORBIDDEN,
        BoardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        BoardError::ResolverUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        BoardError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

pub fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!("Internal error: {:?}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
}

pub fn parse_listing_id(raw: String) -> Result<ListingId, ApiError> {
    ListingId::new(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_errors_map_to_statuses() {
        let cases = [
            (BoardError::ListingNotFound, StatusCode::NOT_FOUND),
            (BoardError::CommentNotFound("x".into()), StatusCode::NOT_FOUND),
            (BoardError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (BoardError::Forbidden, StatusCode::FORBIDDEN),
            (BoardError::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (
                BoardError::ResolverUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                BoardError::StoreFailure("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(board_error(err).0, status);
        }
    }

    #[test]
    fn listing_ids_in_paths_are_digits() {
        assert_eq!(parse_listing_id("34683501".into()).unwrap().as_str(), "34683501");
        assert_eq!(
            parse_listing_id("abc".into()).unwrap_err().0,
            StatusCode::BAD_REQUEST
        );
    }
}
