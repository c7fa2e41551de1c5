use std::collections::BTreeSet;

use crate::models::{ListingId, Topic, Viewer};

/// Write commands. `viewer` is `None` when the caller is signed out; the
/// worker rejects those before touching the store.
#[derive(Debug)]
pub enum AppCommand {
    PostComment {
        listing_id: ListingId,
        viewer: Option<Viewer>,
        nickname: String,
        text: String,
        topics: BTreeSet<Topic>,
        parent_id: Option<String>,
    },
    ToggleLike {
        listing_id: ListingId,
        viewer: Option<Viewer>,
        comment_id: String,
        liked: bool,
    },
    DeleteComment {
        listing_id: ListingId,
        viewer: Option<Viewer>,
        comment_id: String,
    },
}

impl AppCommand {
    pub fn listing_id(&self) -> &ListingId {
        match self {
            AppCommand::PostComment { listing_id, .. }
            | AppCommand::ToggleLike { listing_id, .. }
            | AppCommand::DeleteComment { listing_id, .. } => listing_id,
        }
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        match self {
            AppCommand::PostComment { viewer, .. }
            | AppCommand::ToggleLike { viewer, .. }
            | AppCommand::DeleteComment { viewer, .. } => viewer.as_ref(),
        }
    }
}
