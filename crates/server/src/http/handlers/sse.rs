use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::{IngestEvent, ListingId};
use futures::stream::Stream;
use tokio::sync::broadcast;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use super::{parse_listing_id, ApiError};
use crate::state::AppState;

fn to_sse(event: IngestEvent) -> Result<Event, axum::Error> {
    let built = match event {
        IngestEvent::CommentSaved { comment, .. } => {
            Event::default().event("new_comment").json_data(comment)
        }
        IngestEvent::CommentDeleted { comment_id, .. } => Event::default()
            .event("delete_comment")
            .json_data(serde_json::json!({ "id": comment_id })),
        IngestEvent::LikeChanged {
            comment_id,
            like_count,
            ..
        } => Event::default()
            .event("like_changed")
            .json_data(serde_json::json!({ "id": comment_id, "like_count": like_count })),
    };
    built.map_err(|e| {
        tracing::error!("SSE serialization error: {}", e);
        axum::Error::new(e)
    })
}

/// The events of `listing_id` only. Lagged receivers skip what they missed.
fn listing_events(
    rx: broadcast::Receiver<IngestEvent>,
    listing_id: ListingId,
) -> impl Stream<Item = IngestEvent> {
    BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.listing_id() == &listing_id => Some(event),
        Ok(_) => None,
        Err(_lagged) => {
            tracing::warn!("SSE Client lagged for listing {}", listing_id);
            None
        }
    })
}

/// Live changes of one listing. Clients re-fetch or patch on each event.
pub async fn sse_handler(
    State(state): State<AppState>,
    Path(listing_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let listing_id = parse_listing_id(listing_id)?;
    let rx = state.tx_ingest.subscribe();
    tracing::info!("SSE Connected: listing={}", listing_id);

    let stream = listing_events(rx, listing_id).map(to_sse);

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(listing: &str, comment: &str) -> IngestEvent {
        IngestEvent::CommentDeleted {
            listing_id: ListingId::new(listing).unwrap(),
            comment_id: comment.into(),
        }
    }

    #[tokio::test]
    async fn only_events_of_the_listing_are_streamed() {
        let (tx, rx) = broadcast::channel(8);
        let stream = listing_events(rx, ListingId::new("77").unwrap());

        tx.send(deleted("77", "a")).unwrap();
        tx.send(deleted("0", "b")).unwrap();
        tx.send(IngestEvent::LikeChanged {
            listing_id: ListingId::new("77").unwrap(),
            comment_id: "c".into(),
            like_count: 3,
        })
        .unwrap();
        drop(tx);

        let events: Vec<IngestEvent> = stream.collect().await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.listing_id().as_str() == "77"));
        assert!(matches!(
            &events[1],
            IngestEvent::LikeChanged { like_count: 3, .. }
        ));
    }

    #[test]
    fn events_serialize_to_sse() {
        assert!(to_sse(deleted("77", "a")).is_ok());
        assert!(to_sse(IngestEvent::LikeChanged {
            listing_id: ListingId::new("77").unwrap(),
            comment_id: "a".into(),
            like_count: 0,
        })
        .is_ok());
    }
}
