use crate::models::{CommentRecord, ListingId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestEvent {
    CommentSaved {
        listing_id: ListingId,
        comment: CommentRecord,
    },
    CommentDeleted {
        listing_id: ListingId,
        comment_id: String,
    },
    LikeChanged {
        listing_id: ListingId,
        comment_id: String,
        like_count: u32,
    },
}

impl IngestEvent {
    pub fn listing_id(&self) -> &ListingId {
        match self {
            IngestEvent::CommentSaved { listing_id, .. }
            | IngestEvent::CommentDeleted { listing_id, .. }
            | IngestEvent::LikeChanged { listing_id, .. } => listing_id,
        }
    }
}
