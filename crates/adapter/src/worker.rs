use domain::{AppCommand, BoardError, CommentRecord, IngestEvent, LikeDelta, NewComment};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::traits::CommentStore;
use crate::CommandEnvelope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Saved(CommentRecord),
    Liked(LikeDelta),
    Deleted { comment_id: String },
}

/// Runs commands one at a time against the store until the channel closes or
/// the token is cancelled. Each success is announced on `tx_ingest`.
pub async fn run(
    store: Arc<dyn CommentStore>,
    mut rx_cmd: mpsc::Receiver<CommandEnvelope>,
    tx_ingest: broadcast::Sender<IngestEvent>,
    cancel_token: CancellationToken,
) -> anyhow::Result<()> {
    info!("Command worker started");
    loop {
        tokio::select! {
            envelope = rx_cmd.recv() => {
                let CommandEnvelope { cmd, resp } = match envelope {
                    Some(e) => e,
                    None => break,
                };

                let result = execute(store.as_ref(), &tx_ingest, cmd).await;
                if let Err(ref e) = result {
                    match e {
                        BoardError::StoreFailure(_) => error!("Command execution failed: {}", e),
                        _ => debug!("Command rejected: {}", e),
                    }
                }
                if resp.send(result).is_err() {
                    warn!("Command caller went away before the reply");
                }
            },
            _ = cancel_token.cancelled() => break,
        }
    }
    info!("Command worker stopped");
    Ok(())
}

pub async fn execute(
    store: &dyn CommentStore,
    tx_ingest: &broadcast::Sender<IngestEvent>,
    cmd: AppCommand,
) -> Result<CommandReply, BoardError> {
    let viewer = cmd.viewer().cloned().ok_or(BoardError::Unauthenticated)?;
    let listing_id = cmd.listing_id().clone();

    match cmd {
        AppCommand::PostComment {
            nickname,
            text,
            topics,
            parent_id,
            ..
        } => {
            let record = store
                .create(NewComment {
                    listing_id: listing_id.clone(),
                    author_id: Some(viewer.id),
                    nickname,
                    text,
                    topics,
                    parent_id,
                })
                .await?;
            info!("Comment saved: {} on listing {}", record.id, listing_id);
            // no subscribers is fine
            let _ = tx_ingest.send(IngestEvent::CommentSaved {
                listing_id,
                comment: record.clone(),
            });
            Ok(CommandReply::Saved(record))
        }
        AppCommand::ToggleLike {
            comment_id, liked, ..
        } => {
            // the store refuses comments that are not on `listing_id`
            let delta = store
                .set_like(&listing_id, &comment_id, &viewer.id, liked)
                .await?;
            let _ = tx_ingest.send(IngestEvent::LikeChanged {
                listing_id,
                comment_id,
                like_count: delta.like_count,
            });
            Ok(CommandReply::Liked(delta))
        }
        AppCommand::DeleteComment { comment_id, .. } => {
            store.delete(&listing_id, &comment_id, &viewer.id).await?;
            info!("Comment deleted: {} on listing {}", comment_id, listing_id);
            let _ = tx_ingest.send(IngestEvent::CommentDeleted {
                listing_id,
                comment_id: comment_id.clone(),
            });
            Ok(CommandReply::Deleted { comment_id })
        }
    }
}
