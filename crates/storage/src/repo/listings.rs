use crate::{models::SqlListing, Db};
use chrono::Utc;
use domain::{ListingId, ListingInfo};

impl Db {
    /// Registers a listing the first time it is seen; later calls refresh the
    /// title when a non-empty one is given.
    pub async fn ensure_listing(&self, listing_id: &str, title: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO listings (listing_id, title, first_seen_at)
            VALUES (?, ?, ?)
            ON CONFLICT(listing_id) DO UPDATE SET
                title = CASE WHEN excluded.title = '' THEN listings.title ELSE excluded.title END
            "#,
        )
        .bind(listing_id)
        .bind(title)
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_listing(&self, listing_id: &str) -> anyhow::Result<Option<ListingInfo>> {
        let row = sqlx::query_as::<_, SqlListing>(
            "SELECT listing_id, title FROM listings WHERE listing_id = ?",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| ListingInfo {
            id: Some(ListingId::new_unchecked(r.listing_id)),
            title: r.title,
        }))
    }
}
