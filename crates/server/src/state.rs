use crate::identity::IdentityGuard;
use adapter::{CommandEnvelope, CommentStore};
use axum::{extract::FromRef, http::HeaderMap};
use domain::{IngestEvent, Language, Viewer};
use std::sync::Arc;
use storage::Db;
use tokio::sync::{broadcast, mpsc};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    // reads go straight to the store, writes through the worker
    pub store: Arc<dyn CommentStore>,
    pub sender: mpsc::Sender<CommandEnvelope>,
    pub tx_ingest: broadcast::Sender<IngestEvent>,
    pub identity: IdentityGuard,
    pub default_language: Language,
}

impl AppState {
    /// The signed-in viewer from `Authorization: Bearer <token>`, if any.
    pub fn viewer(&self, headers: &HeaderMap) -> Option<Viewer> {
        let token = headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))?;
        self.identity.verify(token.trim())
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory database behind the SQLite store, with a running worker.
    pub async fn for_tests() -> Self {
        let db = Db::new("sqlite::memory:").await.unwrap();
        let store: Arc<dyn CommentStore> = Arc::new(db.clone());
        let (sender, rx_cmd) = mpsc::channel(16);
        let (tx_ingest, _) = broadcast::channel(16);
        tokio::spawn(adapter::worker::run(
            store.clone(),
            rx_cmd,
            tx_ingest.clone(),
            tokio_util::sync::CancellationToken::new(),
        ));
        Self {
            db,
            store,
            sender,
            tx_ingest,
            identity: IdentityGuard::new("test-secret", 1),
            default_language: Language::En,
        }
    }

    /// A bearer header for a freshly signed-in viewer.
    pub fn sign_in(&self, name: &str) -> (HeaderMap, Viewer) {
        let (token, viewer) = self.identity.issue(name).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        (headers, viewer)
    }
}
