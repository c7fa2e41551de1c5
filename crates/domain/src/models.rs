use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        if s.is_empty() {
            return Err("Listing ID cannot be empty.".to_string());
        }
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err("Listing ID must be numeric.".to_string());
        }
        if s.len() > 32 {
            return Err("Listing ID is too long (max 32 digits).".to_string());
        }
        Ok(Self(s))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Price,
    Noise,
    Security,
    Accesses,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Price, Topic::Noise, Topic::Security, Topic::Accesses];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Price => "price",
            Topic::Noise => "noise",
            Topic::Security => "security",
            Topic::Accesses => "accesses",
        }
    }
}

impl FromStr for Topic {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BoardError::InvalidInput(format!("Unknown topic: {}", s)))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the page agent reports for the active tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingInfo {
    pub id: Option<ListingId>,
    pub title: String,
}

/// A flat comment as stored. `parent_id == None` marks a root comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub listing_id: ListingId,
    pub author_id: Option<String>,
    pub nickname: String,
    pub text: String,
    #[serde(default)]
    pub topics: BTreeSet<Topic>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
    pub created_at: Option<NaiveDateTime>,
    pub parent_id: Option<String>,
}

impl CommentRecord {
    /// Ordering key for siblings. A missing timestamp sorts first.
    pub fn sort_key(&self) -> (Option<NaiveDateTime>, &str) {
        (self.created_at, self.id.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_liked_by(&self, viewer_id: &str) -> bool {
        self.liked_by.contains(viewer_id)
    }

    pub fn is_authored_by(&self, viewer_id: &str) -> bool {
        self.author_id.as_deref() == Some(viewer_id)
    }
}

/// A comment to be created; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub listing_id: ListingId,
    pub author_id: Option<String>,
    pub nickname: String,
    pub text: String,
    pub topics: BTreeSet<Topic>,
    pub parent_id: Option<String>,
}

impl NewComment {
    pub const MAX_TEXT_LEN: usize = 2000;

    /// Trims the body and rejects empty or oversized input.
    pub fn validated(mut self) -> Result<Self, BoardError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(BoardError::InvalidInput("Comment text cannot be empty".into()));
        }
        if text.chars().count() > Self::MAX_TEXT_LEN {
            return Err(BoardError::InvalidInput(format!(
                "Comment text is too long (max {} chars)",
                Self::MAX_TEXT_LEN
            )));
        }
        self.text = text.to_string();
        if self.nickname.trim().is_empty() {
            self.nickname = crate::preferences::DEFAULT_NICKNAME.to_string();
        }
        Ok(self)
    }

    pub fn into_record(self, id: String, created_at: NaiveDateTime) -> CommentRecord {
        CommentRecord {
            id,
            listing_id: self.listing_id,
            author_id: self.author_id,
            nickname: self.nickname,
            text: self.text,
            topics: self.topics,
            like_count: 0,
            liked_by: BTreeSet::new(),
            created_at: Some(created_at),
            parent_id: self.parent_id,
        }
    }
}

/// A record plus its replies, rebuilt on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub record: CommentRecord,
    pub children: Vec<CommentNode>,
}

impl CommentNode {
    pub fn leaf(record: CommentRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub display_name: String,
}

/// Result of a like toggle, carrying what has to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeDelta {
    pub comment_id: String,
    pub viewer_id: String,
    pub liked: bool,
    pub like_count: u32,
}

impl LikeDelta {
    pub fn step(&self) -> i32 {
        if self.liked {
            1
        } else {
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_id_accepts_digits_only() {
        assert!(ListingId::new("34683501").is_ok());
        assert!(ListingId::new("").is_err());
        assert!(ListingId::new("12a").is_err());
        assert!(ListingId::new("1".repeat(33)).is_err());
    }

    #[test]
    fn topic_parsing_is_case_insensitive() {
        assert_eq!("Noise".parse::<Topic>().unwrap(), Topic::Noise);
        assert_eq!(" accesses ".parse::<Topic>().unwrap(), Topic::Accesses);
        assert!(matches!(
            "garden".parse::<Topic>(),
            Err(BoardError::InvalidInput(_))
        ));
    }

    #[test]
    fn new_comment_validation() {
        let draft = NewComment {
            listing_id: ListingId::new("1").unwrap(),
            author_id: Some("u1".into()),
            nickname: "  ".into(),
            text: "  Noisy street at night.  ".into(),
            topics: BTreeSet::new(),
            parent_id: None,
        };
        let ok = draft.clone().validated().unwrap();
        assert_eq!(ok.text, "Noisy street at night.");
        assert_eq!(ok.nickname, "Guest");

        let empty = NewComment {
            text: "   ".into(),
            ..draft
        };
        assert!(matches!(empty.validated(), Err(BoardError::InvalidInput(_))));
    }

    #[test]
    fn node_serializes_flat_with_children() {
        let record = NewComment {
            listing_id: ListingId::new("7").unwrap(),
            author_id: None,
            nickname: "Maria1990".into(),
            text: "Is the street noisy?".into(),
            topics: [Topic::Noise].into_iter().collect(),
            parent_id: None,
        }
        .into_record("c1".into(), NaiveDateTime::default());
        let json = serde_json::to_value(CommentNode::leaf(record)).unwrap();
        assert_eq!(json["id"], "c1");
        assert_eq!(json["listing_id"], "7");
        assert_eq!(json["topics"][0], "noise");
        assert!(json["children"].as_array().unwrap().is_empty());
    }
}
