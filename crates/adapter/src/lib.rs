mod controller;
mod drivers;
mod session;
mod traits;
pub mod worker;

pub use controller::{
    resolve_with_retry, BoardController, BoardView, CommandOutcome, ControllerOptions,
};
pub use drivers::memory::MemoryStore;
pub use session::{FetchTicket, LoadState, Session};
pub use traits::{CommentStore, ListingResolver};
pub use worker::CommandReply;

use domain::{AppCommand, BoardError, IngestEvent};
use serde::Deserialize;
use std::sync::Arc;
use storage::Db;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A command plus the channel its caller waits on.
pub struct CommandEnvelope {
    pub cmd: AppCommand,
    pub resp: oneshot::Sender<Result<CommandReply, BoardError>>,
}

/// Which driver backs the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Sqlite,
    Memory,
}

pub fn build_store(mode: StoreMode, db: &Db) -> Arc<dyn CommentStore> {
    match mode {
        StoreMode::Sqlite => {
            info!("Initializing board in SQLITE mode...");
            Arc::new(db.clone())
        }
        StoreMode::Memory => {
            info!("Initializing board in MEMORY mode...");
            Arc::new(MemoryStore::new())
        }
    }
}

pub async fn start_with_cancel_token(
    store: Arc<dyn CommentStore>,
    rx: mpsc::Receiver<CommandEnvelope>,
    tx_ingest: broadcast::Sender<IngestEvent>,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    worker::run(store, rx, tx_ingest, cancel_token).await
}
