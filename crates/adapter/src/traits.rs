use async_trait::async_trait;
use domain::{BoardError, CommentRecord, LikeDelta, ListingId, ListingInfo, NewComment};

/// Where comments live. Implementations are the source of truth for a
/// listing's records; callers assemble the forest themselves.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn fetch_by_listing(&self, listing_id: &ListingId)
        -> Result<Vec<CommentRecord>, BoardError>;

    /// Persists the comment and returns it with its assigned id.
    async fn create(&self, comment: NewComment) -> Result<CommentRecord, BoardError>;

    /// Removes a comment of `listing_id`. Only its author may do so. A
    /// comment that lives on another listing is `CommentNotFound`.
    async fn delete(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        requester_id: &str,
    ) -> Result<(), BoardError>;

    /// Sets `viewer_id`'s like to `liked`; a no-op when it already is. Scoped
    /// to `listing_id` like `delete`.
    async fn set_like(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        viewer_id: &str,
        liked: bool,
    ) -> Result<LikeDelta, BoardError>;
}

/// The page agent. An `Err` means the agent could not be reached and the
/// question may be asked again; `Ok` with no id means the page is not a
/// listing.
#[async_trait]
pub trait ListingResolver: Send + Sync {
    async fn resolve(&self) -> Result<ListingInfo, BoardError>;
}
