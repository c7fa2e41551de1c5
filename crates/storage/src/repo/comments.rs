use crate::{
    models::{encode_topics, SqlComment, SqlLike},
    new_comment_id, Db,
};
use chrono::Utc;
use domain::{CommentRecord, ListingId, NewComment};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { listing_id: ListingId },
    NotFound,
    NotAuthor,
}

const SELECT_COMMENT: &str = r#"
    SELECT id, listing_id, author_id, nickname, content, topics,
           like_count, created_at, parent_id
    FROM comments
"#;

impl Db {
    /// Inserts a new comment. Returns `None` when `parent_id` names a comment
    /// that does not exist on the same listing.
    pub async fn insert_comment(&self, c: &NewComment) -> anyhow::Result<Option<CommentRecord>> {
        let mut tx = self.pool.begin().await?;

        if let Some(parent_id) = &c.parent_id {
            let parent: Option<(String,)> =
                sqlx::query_as("SELECT id FROM comments WHERE id = ? AND listing_id = ?")
                    .bind(parent_id)
                    .bind(c.listing_id.as_str())
                    .fetch_optional(&mut *tx)
                    .await?;
            if parent.is_none() {
                return Ok(None);
            }
        }

        let id = new_comment_id();
        let created_at = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO comments (
                id, listing_id, author_id, nickname,
                content, topics, like_count, created_at, parent_id
            )
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(c.listing_id.as_str())
        .bind(&c.author_id)
        .bind(&c.nickname)
        .bind(&c.text)
        .bind(encode_topics(&c.topics))
        .bind(created_at)
        .bind(&c.parent_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(c.clone().into_record(id, created_at)))
    }

    #[cfg(test)]
    pub(crate) async fn get_comment(&self, comment_id: &str) -> anyhow::Result<Option<CommentRecord>> {
        let row = sqlx::query_as::<_, SqlComment>(&format!("{} WHERE id = ?", SELECT_COMMENT))
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let liked_by: Vec<(String,)> =
            sqlx::query_as("SELECT viewer_id FROM comment_likes WHERE comment_id = ?")
                .bind(comment_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(row.into_record(liked_by.into_iter().map(|(v,)| v).collect())))
    }

    /// All comments of a listing, flat and in no particular order.
    pub async fn list_comments(&self, listing_id: &str) -> anyhow::Result<Vec<CommentRecord>> {
        let rows = sqlx::query_as::<_, SqlComment>(&format!(
            "{} WHERE listing_id = ?",
            SELECT_COMMENT
        ))
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        let likes = sqlx::query_as::<_, SqlLike>(
            r#"
            SELECT l.comment_id, l.viewer_id
            FROM comment_likes l
            JOIN comments c ON c.id = l.comment_id
            WHERE c.listing_id = ?
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        let mut liked_by: HashMap<String, BTreeSet<String>> = HashMap::new();
        for like in likes {
            liked_by
                .entry(like.comment_id)
                .or_default()
                .insert(like.viewer_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let likes = liked_by.remove(&row.id).unwrap_or_default();
                row.into_record(likes)
            })
            .collect())
    }

    /// Hard delete, only for the author. Replies stay and become orphans.
    /// A comment on another listing counts as not found.
    pub async fn delete_comment(
        &self,
        listing_id: &str,
        comment_id: &str,
        requester_id: &str,
    ) -> anyhow::Result<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String, Option<String>)> = sqlx::query_as(
            "SELECT listing_id, author_id FROM comments WHERE id = ? AND listing_id = ?",
        )
        .bind(comment_id)
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (listing_id, author_id) = match row {
            Some(r) => r,
            None => return Ok(DeleteOutcome::NotFound),
        };
        if author_id.as_deref() != Some(requester_id) {
            return Ok(DeleteOutcome::NotAuthor);
        }

        sqlx::query("DELETE FROM comment_likes WHERE comment_id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(DeleteOutcome::Deleted {
            listing_id: ListingId::new_unchecked(listing_id),
        })
    }
}
