use chrono::NaiveDateTime;
use domain::{CommentRecord, ListingId, Topic};
use sqlx::FromRow;
use std::collections::BTreeSet;

#[derive(FromRow)]
pub struct SqlComment {
    pub id: String,
    pub listing_id: String,
    pub author_id: Option<String>,
    pub nickname: String,
    pub content: String,
    // comma separated topic names
    pub topics: String,
    pub like_count: i64,
    pub created_at: NaiveDateTime,
    pub parent_id: Option<String>,
}

impl SqlComment {
    pub fn into_record(self, liked_by: BTreeSet<String>) -> CommentRecord {
        CommentRecord {
            id: self.id,
            listing_id: ListingId::new_unchecked(self.listing_id),
            author_id: self.author_id,
            nickname: self.nickname,
            text: self.content,
            topics: decode_topics(&self.topics),
            like_count: u32::try_from(self.like_count.max(0)).unwrap_or(u32::MAX),
            liked_by,
            created_at: Some(self.created_at),
            parent_id: self.parent_id,
        }
    }
}

#[derive(FromRow)]
pub struct SqlLike {
    pub comment_id: String,
    pub viewer_id: String,
}

#[derive(FromRow)]
pub struct SqlListing {
    pub listing_id: String,
    pub title: String,
}

pub fn encode_topics(topics: &BTreeSet<Topic>) -> String {
    topics
        .iter()
        .map(Topic::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Unknown names are skipped so old rows keep loading.
pub fn decode_topics(raw: &str) -> BTreeSet<Topic> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
