use async_trait::async_trait;
use domain::{BoardError, CommentRecord, LikeDelta, ListingId, NewComment};
use storage::{Db, DeleteOutcome};
use tracing::{debug, error};

use crate::traits::CommentStore;

fn store_failure(op: &str, e: anyhow::Error) -> BoardError {
    error!("Store {} failed: {:?}", op, e);
    BoardError::store(e)
}

#[async_trait]
impl CommentStore for Db {
    async fn fetch_by_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<CommentRecord>, BoardError> {
        self.list_comments(listing_id.as_str())
            .await
            .map_err(|e| store_failure("fetch", e))
    }

    async fn create(&self, comment: NewComment) -> Result<CommentRecord, BoardError> {
        let comment = comment.validated()?;
        match self.insert_comment(&comment).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(BoardError::CommentNotFound(
                comment.parent_id.unwrap_or_default(),
            )),
            Err(e) => Err(store_failure("create", e)),
        }
    }

    async fn delete(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        requester_id: &str,
    ) -> Result<(), BoardError> {
        match self
            .delete_comment(listing_id.as_str(), comment_id, requester_id)
            .await
        {
            Ok(DeleteOutcome::Deleted { listing_id }) => {
                debug!("Removed {} from listing {}", comment_id, listing_id);
                Ok(())
            }
            Ok(DeleteOutcome::NotFound) => Err(BoardError::CommentNotFound(comment_id.to_string())),
            Ok(DeleteOutcome::NotAuthor) => Err(BoardError::Forbidden),
            Err(e) => Err(store_failure("delete", e)),
        }
    }

    async fn set_like(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        viewer_id: &str,
        liked: bool,
    ) -> Result<LikeDelta, BoardError> {
        match Db::set_like(self, listing_id.as_str(), comment_id, viewer_id, liked).await {
            Ok(Some(like_count)) => Ok(LikeDelta {
                comment_id: comment_id.to_string(),
                viewer_id: viewer_id.to_string(),
                liked,
                like_count,
            }),
            Ok(None) => Err(BoardError::CommentNotFound(comment_id.to_string())),
            Err(e) => Err(store_failure("like", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::thread;

    fn draft(author: &str, parent: Option<&str>) -> NewComment {
        NewComment {
            listing_id: ListingId::new("34683501").unwrap(),
            author_id: Some(author.into()),
            nickname: "Maria1990".into(),
            text: "Does anyone know if the street is noisy at night?".into(),
            topics: Default::default(),
            parent_id: parent.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn store_errors_map_to_board_errors() {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let store: &dyn CommentStore = &db;

        let listing = ListingId::new("34683501").unwrap();
        let elsewhere = ListingId::new("1").unwrap();
        let root = store.create(draft("u1", None)).await.unwrap();
        assert!(store
            .create(draft("u1", Some("ghost")))
            .await
            .unwrap_err()
            .is_not_found());

        let delta = store.set_like(&listing, &root.id, "u2", true).await.unwrap();
        assert_eq!((delta.like_count, delta.step()), (1, 1));
        assert!(store
            .set_like(&listing, "ghost", "u2", true)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .set_like(&elsewhere, &root.id, "u3", true)
            .await
            .unwrap_err()
            .is_not_found());

        assert_eq!(
            store.delete(&listing, &root.id, "u2").await.unwrap_err(),
            BoardError::Forbidden
        );
        assert!(store
            .delete(&elsewhere, &root.id, "u1")
            .await
            .unwrap_err()
            .is_not_found());

        let forest = thread::build_forest(store.fetch_by_listing(&listing).await.unwrap());
        assert_eq!(forest[0].record.liked_by.len(), 1);

        store.delete(&listing, &root.id, "u1").await.unwrap();
        assert!(store.fetch_by_listing(&listing).await.unwrap().is_empty());
    }
}
