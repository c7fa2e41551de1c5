use domain::{thread, CommentNode, CommentRecord, ListingId, ListingInfo, Preferences, Viewer};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Detecting,
    NoListing,
    Loading,
    Loaded,
    Failed,
}

/// Identifies one fetch. Only the newest answered fetch for the current
/// listing may replace the forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    listing_id: ListingId,
}

impl FetchTicket {
    pub fn listing_id(&self) -> &ListingId {
        &self.listing_id
    }
}

/// Everything the board shows, owned in one place and replaced wholesale on
/// each fetch.
#[derive(Debug, Clone)]
pub struct Session {
    listing: Option<ListingInfo>,
    viewer: Option<Viewer>,
    preferences: Preferences,
    forest: Vec<CommentNode>,
    state: LoadState,
    issued: u64,
    applied: u64,
}

impl Session {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            listing: None,
            viewer: None,
            preferences,
            forest: Vec::new(),
            state: LoadState::Detecting,
            issued: 0,
            applied: 0,
        }
    }

    pub fn listing(&self) -> Option<&ListingInfo> {
        self.listing.as_ref()
    }

    pub fn listing_id(&self) -> Option<&ListingId> {
        self.listing.as_ref().and_then(|l| l.id.as_ref())
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    pub fn forest(&self) -> &[CommentNode] {
        &self.forest
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn can_post(&self) -> bool {
        self.viewer.is_some() && self.listing_id().is_some()
    }

    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        self.viewer = viewer;
    }

    /// Switching listing drops the old forest; a page without an id leaves the
    /// session in `NoListing`.
    pub fn set_listing(&mut self, listing: ListingInfo) {
        self.forest.clear();
        self.state = if listing.is_detected() {
            LoadState::Loading
        } else {
            LoadState::NoListing
        };
        self.listing = Some(listing);
    }

    pub fn clear_listing(&mut self) {
        self.forest.clear();
        self.listing = None;
        self.state = LoadState::NoListing;
    }

    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        let listing_id = self.listing_id()?.clone();
        self.issued += 1;
        Some(FetchTicket {
            seq: self.issued,
            listing_id,
        })
    }

    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.seq > self.applied && self.listing_id() == Some(&ticket.listing_id)
    }

    /// Assembles and installs the records. Returns `false` and leaves the
    /// session untouched when a newer fetch already landed or the listing
    /// changed meanwhile.
    pub fn apply_fetch(&mut self, ticket: &FetchTicket, records: Vec<CommentRecord>) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale fetch #{}", ticket.seq);
            return false;
        }
        let assembly = thread::assemble(records);
        if !assembly.orphans.is_empty() {
            debug!(
                "Dropped {} orphaned comment(s) on listing {}",
                assembly.orphans.len(),
                ticket.listing_id
            );
        }
        self.forest = assembly.forest;
        self.applied = ticket.seq;
        self.state = LoadState::Loaded;
        true
    }

    pub fn fail_fetch(&mut self, ticket: &FetchTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.forest.clear();
        self.applied = ticket.seq;
        self.state = LoadState::Failed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn listing(id: &str) -> ListingInfo {
        ListingInfo {
            id: Some(ListingId::new(id).unwrap()),
            title: "T2 Arroios".into(),
        }
    }

    fn record(id: &str, listing: &str) -> CommentRecord {
        CommentRecord {
            id: id.into(),
            listing_id: ListingId::new(listing).unwrap(),
            author_id: None,
            nickname: "Guest".into(),
            text: "hello".into(),
            topics: BTreeSet::new(),
            like_count: 0,
            liked_by: BTreeSet::new(),
            created_at: None,
            parent_id: None,
        }
    }

    #[test]
    fn no_ticket_without_listing() {
        let mut session = Session::new(Preferences::default());
        assert!(session.begin_fetch().is_none());
        session.set_listing(ListingInfo::not_found());
        assert_eq!(session.state(), LoadState::NoListing);
        assert!(session.begin_fetch().is_none());
    }

    #[test]
    fn older_fetch_cannot_overwrite_newer() {
        let mut session = Session::new(Preferences::default());
        session.set_listing(listing("1"));
        let old = session.begin_fetch().unwrap();
        let new = session.begin_fetch().unwrap();

        assert!(session.apply_fetch(&new, vec![record("a", "1"), record("b", "1")]));
        assert!(!session.apply_fetch(&old, vec![]));
        assert!(!session.fail_fetch(&old));
        assert_eq!(session.forest().len(), 2);
        assert_eq!(session.state(), LoadState::Loaded);
    }

    #[test]
    fn fetch_for_previous_listing_is_discarded() {
        let mut session = Session::new(Preferences::default());
        session.set_listing(listing("1"));
        let ticket = session.begin_fetch().unwrap();
        session.set_listing(listing("2"));
        assert!(!session.apply_fetch(&ticket, vec![record("a", "1")]));
        assert!(session.forest().is_empty());
        assert_eq!(session.state(), LoadState::Loading);
    }

    #[test]
    fn can_post_needs_viewer_and_listing() {
        let mut session = Session::new(Preferences::default());
        session.set_listing(listing("1"));
        assert!(!session.can_post());
        session.set_viewer(Some(Viewer {
            id: "v".into(),
            display_name: "V".into(),
        }));
        assert!(session.can_post());
        session.clear_listing();
        assert!(!session.can_post());
    }
}
