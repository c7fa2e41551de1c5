use crate::Db;
use domain::{Language, Preferences};
use sqlx::Row;

const NICKNAME_KEY: &str = "nickname";
const LANGUAGE_KEY: &str = "language";

impl Db {
    pub async fn get_setting(&self, viewer_id: &str, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE viewer_id = ? AND key = ?")
            .bind(viewer_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get(0)))
    }

    pub async fn save_setting(&self, viewer_id: &str, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO preferences (viewer_id, key, value) VALUES (?, ?, ?) ON CONFLICT(viewer_id, key) DO UPDATE SET value = excluded.value"
        )
        .bind(viewer_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Missing or unreadable values fall back to the defaults.
    pub async fn get_preferences(
        &self,
        viewer_id: &str,
        default_language: Language,
    ) -> anyhow::Result<Preferences> {
        let mut prefs = Preferences::with_language(default_language);
        if let Some(nickname) = self.get_setting(viewer_id, NICKNAME_KEY).await? {
            prefs.set_nickname(&nickname);
        }
        if let Some(lang) = self.get_setting(viewer_id, LANGUAGE_KEY).await? {
            match lang.parse() {
                Ok(l) => prefs.language = l,
                Err(e) => tracing::warn!("Ignoring stored language for {}: {}", viewer_id, e),
            }
        }
        Ok(prefs)
    }

    pub async fn save_preferences(&self, viewer_id: &str, prefs: &Preferences) -> anyhow::Result<()> {
        self.save_setting(viewer_id, NICKNAME_KEY, &prefs.nickname)
            .await?;
        self.save_setting(viewer_id, LANGUAGE_KEY, prefs.language.as_str())
            .await?;
        Ok(())
    }
}
