use crate::Db;

impl Db {
    /// Adds or removes `viewer_id`'s like and adjusts the counter in the same
    /// transaction. Setting the state it already has changes nothing.
    /// Returns the resulting count, or `None` if the comment does not exist
    /// on `listing_id`.
    pub async fn set_like(
        &self,
        listing_id: &str,
        comment_id: &str,
        viewer_id: &str,
        liked: bool,
    ) -> anyhow::Result<Option<u32>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT like_count FROM comments WHERE id = ? AND listing_id = ?")
                .bind(comment_id)
                .bind(listing_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let changed = if liked {
            sqlx::query("INSERT OR IGNORE INTO comment_likes (comment_id, viewer_id) VALUES (?, ?)")
                .bind(comment_id)
                .bind(viewer_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = ? AND viewer_id = ?")
                .bind(comment_id)
                .bind(viewer_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };

        if changed == 1 {
            let step: i64 = if liked { 1 } else { -1 };
            sqlx::query("UPDATE comments SET like_count = MAX(like_count + ?, 0) WHERE id = ?")
                .bind(step)
                .bind(comment_id)
                .execute(&mut *tx)
                .await?;
        }

        let (count,): (i64,) = sqlx::query_as("SELECT like_count FROM comments WHERE id = ?")
            .bind(comment_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(u32::try_from(count.max(0)).unwrap_or(u32::MAX)))
    }
}
