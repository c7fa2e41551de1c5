mod comments;
mod likes;
mod listings;
mod preferences;

pub use comments::DeleteOutcome;
