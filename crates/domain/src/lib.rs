mod commands;
mod error;
mod events;
mod listing;
mod locales;
mod models;
mod preferences;
pub mod thread;

pub use commands::AppCommand;
pub use error::BoardError;
pub use events::IngestEvent;
pub use listing::{parse_listing_id, LISTING_PATH_MARKER};
pub use locales::{tr, Language, Text};
pub use models::{
    CommentNode, CommentRecord, LikeDelta, ListingId, ListingInfo, NewComment, Topic, Viewer,
};
pub use preferences::{Preferences, DEFAULT_NICKNAME};
