use async_trait::async_trait;
use chrono::Utc;
use domain::{thread, BoardError, CommentNode, CommentRecord, LikeDelta, ListingId, NewComment};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::traits::CommentStore;

/// Local-only board: each listing's forest is kept in memory and mutated in
/// place. Ids are creation timestamps in milliseconds, bumped when two
/// comments land in the same millisecond.
#[derive(Clone, Default)]
pub struct MemoryStore {
    forests: Arc<RwLock<HashMap<ListingId, Vec<CommentNode>>>>,
    last_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, now_millis: i64) -> String {
        let mut prev = self.last_id.load(Ordering::Relaxed);
        loop {
            let candidate = now_millis.max(prev + 1);
            match self.last_id.compare_exchange_weak(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }

    /// The forest of `listing_id`, provided it holds `comment_id`.
    fn forest_holding<'a>(
        forests: &'a mut HashMap<ListingId, Vec<CommentNode>>,
        listing_id: &ListingId,
        comment_id: &str,
    ) -> Result<&'a mut Vec<CommentNode>, BoardError> {
        forests
            .get_mut(listing_id)
            .filter(|forest| thread::find(forest, comment_id).is_some())
            .ok_or_else(|| BoardError::CommentNotFound(comment_id.to_string()))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn fetch_by_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<CommentRecord>, BoardError> {
        let forests = self.forests.read().await;
        Ok(forests
            .get(listing_id)
            .map(|forest| thread::flatten(forest))
            .unwrap_or_default())
    }

    async fn create(&self, comment: NewComment) -> Result<CommentRecord, BoardError> {
        let comment = comment.validated()?;
        let now = Utc::now();
        let id = self.next_id(now.timestamp_millis());
        let parent_id = comment.parent_id.clone();
        let record = comment.into_record(id, now.naive_utc());

        let mut forests = self.forests.write().await;
        let forest = forests.entry(record.listing_id.clone()).or_default();
        match parent_id {
            Some(parent) => thread::insert_reply(forest, &parent, record.clone())?,
            None => thread::insert_root(forest, record.clone()),
        }
        debug!("Local comment {} stored", record.id);
        Ok(record)
    }

    async fn delete(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        requester_id: &str,
    ) -> Result<(), BoardError> {
        let mut forests = self.forests.write().await;
        let forest = Self::forest_holding(&mut forests, listing_id, comment_id)?;

        let is_author = thread::find(forest, comment_id)
            .map(|n| n.record.is_authored_by(requester_id))
            .unwrap_or(false);
        if !is_author {
            return Err(BoardError::Forbidden);
        }
        thread::remove_node(forest, comment_id);
        Ok(())
    }

    async fn set_like(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        viewer_id: &str,
        liked: bool,
    ) -> Result<LikeDelta, BoardError> {
        let mut forests = self.forests.write().await;
        let forest = Self::forest_holding(&mut forests, listing_id, comment_id)?;

        let node = thread::find(forest, comment_id)
            .ok_or_else(|| BoardError::CommentNotFound(comment_id.to_string()))?;
        if node.record.is_liked_by(viewer_id) == liked {
            return Ok(LikeDelta {
                comment_id: comment_id.to_string(),
                viewer_id: viewer_id.to_string(),
                liked,
                like_count: node.record.like_count,
            });
        }
        thread::toggle_like(forest, comment_id, viewer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Topic;

    fn draft(author: &str, text: &str, parent: Option<&str>) -> NewComment {
        NewComment {
            listing_id: ListingId::new("34683501").unwrap(),
            author_id: Some(author.into()),
            nickname: "HouseHunter_PT".into(),
            text: text.into(),
            topics: [Topic::Security].into_iter().collect(),
            parent_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn ids_strictly_increase() {
        let store = MemoryStore::new();
        let a: i64 = store.next_id(1000).parse().unwrap();
        let b: i64 = store.next_id(1000).parse().unwrap();
        let c: i64 = store.next_id(900).parse().unwrap();
        assert!(a < b && b < c);
    }

    #[tokio::test]
    async fn create_reply_like_delete() {
        let store = MemoryStore::new();
        let listing = ListingId::new("34683501").unwrap();

        let root = store.create(draft("u1", "Bright flat.", None)).await.unwrap();
        let reply = store
            .create(draft("u2", "Agreed.", Some(&root.id)))
            .await
            .unwrap();
        assert_eq!(reply.parent_id.as_deref(), Some(root.id.as_str()));

        let err = store
            .create(draft("u2", "Lost.", Some("ghost")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let delta = store.set_like(&listing, &reply.id, "v1", true).await.unwrap();
        assert_eq!(delta.like_count, 1);
        let again = store.set_like(&listing, &reply.id, "v1", true).await.unwrap();
        assert_eq!(again.like_count, 1);

        let forest = thread::build_forest(store.fetch_by_listing(&listing).await.unwrap());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children[0].record.like_count, 1);

        assert_eq!(
            store.delete(&listing, &root.id, "u2").await.unwrap_err(),
            BoardError::Forbidden
        );
        store.delete(&listing, &root.id, "u1").await.unwrap();
        assert!(store.fetch_by_listing(&listing).await.unwrap().is_empty());
        assert!(store
            .delete(&listing, &root.id, "u1")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_listing() {
        let store = MemoryStore::new();
        let root = store.create(draft("u1", "Bright flat.", None)).await.unwrap();
        let other = ListingId::new("1").unwrap();
        store
            .create(NewComment {
                listing_id: other.clone(),
                ..draft("u1", "Other flat.", None)
            })
            .await
            .unwrap();

        assert!(store
            .set_like(&other, &root.id, "v1", true)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .delete(&other, &root.id, "u1")
            .await
            .unwrap_err()
            .is_not_found());

        let listing = ListingId::new("34683501").unwrap();
        let records = store.fetch_by_listing(&listing).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].like_count, 0);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let store = MemoryStore::new();
        let err = store.create(draft("u1", "  ", None)).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidInput(_)));
    }
}
