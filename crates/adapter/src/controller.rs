use domain::{
    thread, tr, BoardError, CommentNode, ListingInfo, NewComment, Preferences, Text, Topic, Viewer,
    DEFAULT_NICKNAME,
};
use std::{collections::BTreeSet, sync::Arc, time::Duration};
use tracing::{debug, error, info, warn};

use crate::session::{LoadState, Session};
use crate::traits::{CommentStore, ListingResolver};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub resolve_attempts: u32,
    pub resolve_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            resolve_attempts: 3,
            resolve_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Signed out or no listing: nothing was sent.
    Blocked,
}

/// What the popup renders, already localized.
#[derive(Debug, PartialEq)]
pub enum BoardView<'a> {
    Detecting {
        message: &'static str,
    },
    NoListing {
        title: &'static str,
        message: &'static str,
    },
    Loading {
        heading: String,
        title: &'a str,
        message: &'static str,
    },
    LoadError {
        heading: String,
        title: &'a str,
        message: &'static str,
    },
    Board {
        heading: String,
        title: &'a str,
        forest: &'a [CommentNode],
        empty_message: Option<&'static str>,
        posting_as: String,
        post_label: &'static str,
        placeholder: &'static str,
        can_post: bool,
        sign_in_hint: Option<&'static str>,
    },
}

/// Asks the page agent up to `attempts` times, sleeping `delay` between tries.
/// Only an unreachable agent is retried; a page without a listing is final.
pub async fn resolve_with_retry(
    resolver: &dyn ListingResolver,
    attempts: u32,
    delay: Duration,
) -> Result<ListingInfo, BoardError> {
    let attempts = attempts.max(1);
    let mut last_err = BoardError::ListingNotFound;
    for attempt in 1..=attempts {
        match resolver.resolve().await {
            Ok(info) if info.is_detected() => return Ok(info),
            Ok(_) => return Err(BoardError::ListingNotFound),
            Err(e) => {
                warn!("Listing detection attempt {}/{} failed: {}", attempt, attempts, e);
                last_err = e;
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    debug!("Giving up on listing detection: {}", last_err);
    Err(BoardError::ListingNotFound)
}

/// Drives one board: holds the session, forwards user gestures to the store
/// and re-fetches after every write.
pub struct BoardController {
    store: Arc<dyn CommentStore>,
    session: Session,
    options: ControllerOptions,
}

impl BoardController {
    pub fn new(
        store: Arc<dyn CommentStore>,
        preferences: Preferences,
        options: ControllerOptions,
    ) -> Self {
        Self {
            store,
            session: Session::new(preferences),
            options,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_viewer(&mut self, viewer: Option<Viewer>) {
        self.session.set_viewer(viewer);
    }

    pub fn set_nickname(&mut self, nickname: &str) {
        self.session.preferences_mut().set_nickname(nickname);
    }

    pub async fn open(&mut self, resolver: &dyn ListingResolver) -> Result<(), BoardError> {
        let attempts = self.options.resolve_attempts;
        match resolve_with_retry(resolver, attempts, self.options.resolve_delay).await {
            Ok(listing) => {
                info!("Opened board for listing {:?}", listing.id);
                self.session.set_listing(listing);
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.session.clear_listing();
                Err(e)
            }
        }
    }

    /// Fetches and reassembles the current listing. Returns whether the
    /// result was installed.
    pub async fn refresh(&mut self) -> bool {
        let Some(ticket) = self.session.begin_fetch() else {
            return false;
        };
        match self.store.fetch_by_listing(ticket.listing_id()).await {
            Ok(records) => self.session.apply_fetch(&ticket, records),
            Err(e) => {
                error!("Failed to load comments for {}: {}", ticket.listing_id(), e);
                self.session.fail_fetch(&ticket)
            }
        }
    }

    pub async fn post(
        &mut self,
        text: &str,
        topics: BTreeSet<Topic>,
    ) -> Result<CommandOutcome, BoardError> {
        self.submit(text, topics, None).await
    }

    pub async fn reply(
        &mut self,
        parent_id: &str,
        text: &str,
        topics: BTreeSet<Topic>,
    ) -> Result<CommandOutcome, BoardError> {
        self.submit(text, topics, Some(parent_id.to_string())).await
    }

    async fn submit(
        &mut self,
        text: &str,
        topics: BTreeSet<Topic>,
        parent_id: Option<String>,
    ) -> Result<CommandOutcome, BoardError> {
        let (Some(viewer), Some(listing_id)) = (self.session.viewer(), self.session.listing_id())
        else {
            debug!("Post blocked: no viewer or no listing");
            return Ok(CommandOutcome::Blocked);
        };

        let comment = NewComment {
            listing_id: listing_id.clone(),
            author_id: Some(viewer.id.clone()),
            nickname: self.session.preferences().nickname.clone(),
            text: text.to_string(),
            topics,
            parent_id,
        }
        .validated()?;

        if let Err(e) = self.store.create(comment).await {
            error!("Failed to post comment: {}", e);
            return Err(e);
        }
        self.refresh().await;
        Ok(CommandOutcome::Applied)
    }

    /// Flips the viewer's like using the membership shown in the current
    /// forest, then reloads.
    pub async fn toggle_like(&mut self, comment_id: &str) -> Result<CommandOutcome, BoardError> {
        let (Some(viewer), Some(listing_id)) = (self.session.viewer(), self.session.listing_id())
        else {
            return Ok(CommandOutcome::Blocked);
        };
        let node = thread::find(self.session.forest(), comment_id)
            .ok_or_else(|| BoardError::CommentNotFound(comment_id.to_string()))?;
        let liked = !node.record.is_liked_by(&viewer.id);
        let viewer_id = viewer.id.clone();
        let listing_id = listing_id.clone();

        if let Err(e) = self
            .store
            .set_like(&listing_id, comment_id, &viewer_id, liked)
            .await
        {
            error!("Failed to update like on {}: {}", comment_id, e);
            return Err(e);
        }
        self.refresh().await;
        Ok(CommandOutcome::Applied)
    }

    pub async fn delete(&mut self, comment_id: &str) -> Result<CommandOutcome, BoardError> {
        let (Some(viewer), Some(listing_id)) = (self.session.viewer(), self.session.listing_id())
        else {
            return Ok(CommandOutcome::Blocked);
        };
        let (viewer_id, listing_id) = (viewer.id.clone(), listing_id.clone());
        if let Err(e) = self.store.delete(&listing_id, comment_id, &viewer_id).await {
            error!("Failed to delete {}: {}", comment_id, e);
            return Err(e);
        }
        self.refresh().await;
        Ok(CommandOutcome::Applied)
    }

    /// The name shown next to "posting as". The stored default nickname is
    /// shown in the popup's language.
    fn author_name(&self) -> &str {
        let lang = self.session.preferences().language;
        let nickname = self.session.preferences().nickname.as_str();
        if self.session.viewer().is_none() {
            tr(lang, Text::AnonUser)
        } else if nickname == DEFAULT_NICKNAME {
            tr(lang, Text::Guest)
        } else {
            nickname
        }
    }

    pub fn view(&self) -> BoardView<'_> {
        let lang = self.session.preferences().language;
        let heading = |id: &str| format!("{}{}", tr(lang, Text::ListingPrefix), id);

        let listing = match self.session.listing() {
            Some(l) => l,
            None if self.session.state() == LoadState::Detecting => {
                return BoardView::Detecting {
                    message: tr(lang, Text::DetectingListing),
                }
            }
            None => {
                return BoardView::NoListing {
                    title: tr(lang, Text::NoListingFound),
                    message: tr(lang, Text::NavigateMessage),
                }
            }
        };
        let Some(id) = listing.id.as_ref() else {
            return BoardView::NoListing {
                title: tr(lang, Text::NoListingFound),
                message: tr(lang, Text::NavigateMessage),
            };
        };

        match self.session.state() {
            LoadState::Failed => BoardView::LoadError {
                heading: heading(id.as_str()),
                title: &listing.title,
                message: tr(lang, Text::ErrorLoading),
            },
            LoadState::Loaded => {
                let forest = self.session.forest();
                let can_post = self.session.can_post();
                BoardView::Board {
                    heading: heading(id.as_str()),
                    title: &listing.title,
                    forest,
                    empty_message: forest.is_empty().then(|| tr(lang, Text::NoComments)),
                    posting_as: format!("{} {}", tr(lang, Text::PostingAs), self.author_name()),
                    post_label: tr(lang, Text::Post),
                    placeholder: tr(lang, Text::Placeholder),
                    can_post,
                    sign_in_hint: (!can_post).then(|| tr(lang, Text::SignInRequired)),
                }
            }
            _ => BoardView::Loading {
                heading: heading(id.as_str()),
                title: &listing.title,
                message: tr(lang, Text::LoadingId),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::memory::MemoryStore;
    use async_trait::async_trait;
    use domain::{CommentRecord, Language, LikeDelta, ListingId};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyResolver {
        failures: u32,
        calls: AtomicU32,
        info: ListingInfo,
    }

    #[async_trait]
    impl ListingResolver for FlakyResolver {
        async fn resolve(&self) -> Result<ListingInfo, BoardError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(BoardError::ResolverUnavailable("no receiver".into()))
            } else {
                Ok(self.info.clone())
            }
        }
    }

    fn resolver(failures: u32, id: Option<&str>) -> FlakyResolver {
        FlakyResolver {
            failures,
            calls: AtomicU32::new(0),
            info: ListingInfo {
                id: id.map(|i| ListingId::new(i).unwrap()),
                title: "Apartamento T1".into(),
            },
        }
    }

    fn options() -> ControllerOptions {
        ControllerOptions {
            resolve_attempts: 3,
            resolve_delay: Duration::from_millis(1),
        }
    }

    fn viewer(id: &str) -> Option<Viewer> {
        Some(Viewer {
            id: id.into(),
            display_name: id.into(),
        })
    }

    struct BrokenStore;

    #[async_trait]
    impl CommentStore for BrokenStore {
        async fn fetch_by_listing(&self, _: &ListingId) -> Result<Vec<CommentRecord>, BoardError> {
            Err(BoardError::StoreFailure("offline".into()))
        }
        async fn create(&self, _: NewComment) -> Result<CommentRecord, BoardError> {
            Err(BoardError::StoreFailure("offline".into()))
        }
        async fn delete(&self, _: &ListingId, _: &str, _: &str) -> Result<(), BoardError> {
            Err(BoardError::StoreFailure("offline".into()))
        }
        async fn set_like(
            &self,
            _: &ListingId,
            _: &str,
            _: &str,
            _: bool,
        ) -> Result<LikeDelta, BoardError> {
            Err(BoardError::StoreFailure("offline".into()))
        }
    }

    #[tokio::test]
    async fn retries_unreachable_agent_three_times() {
        let r = resolver(2, Some("10"));
        let info = resolve_with_retry(&r, 3, Duration::from_millis(1)).await.unwrap();
        assert_eq!(info.id.unwrap().as_str(), "10");
        assert_eq!(r.calls.load(Ordering::SeqCst), 3);

        let r = resolver(5, Some("10"));
        let err = resolve_with_retry(&r, 3, Duration::from_millis(1)).await.unwrap_err();
        assert_eq!(err, BoardError::ListingNotFound);
        assert_eq!(r.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn page_without_listing_is_not_retried() {
        let r = resolver(0, None);
        let mut board = BoardController::new(
            Arc::new(MemoryStore::new()),
            Preferences::with_language(Language::Pt),
            options(),
        );
        assert_eq!(board.open(&r).await.unwrap_err(), BoardError::ListingNotFound);
        assert_eq!(r.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            board.view(),
            BoardView::NoListing {
                title: "Anúncio não encontrado",
                message: "Por favor navegue para um anúncio do idealista.",
            }
        );
    }

    #[tokio::test]
    async fn signed_out_writes_are_blocked() {
        let mut board =
            BoardController::new(Arc::new(MemoryStore::new()), Preferences::default(), options());
        board.open(&resolver(0, Some("10"))).await.unwrap();
        assert_eq!(
            board.post("hello", BTreeSet::new()).await.unwrap(),
            CommandOutcome::Blocked
        );
        assert_eq!(board.delete("x").await.unwrap(), CommandOutcome::Blocked);
        match board.view() {
            BoardView::Board {
                can_post,
                empty_message,
                sign_in_hint,
                posting_as,
                ..
            } => {
                assert!(!can_post);
                assert_eq!(empty_message, Some("No comments yet. Be the first!"));
                assert_eq!(sign_in_hint, Some("Sign in to post."));
                assert_eq!(posting_as, "Posting as: AnonUser");
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[tokio::test]
    async fn board_labels_follow_the_language() {
        let mut board = BoardController::new(
            Arc::new(MemoryStore::new()),
            Preferences::with_language(Language::Pt),
            options(),
        );
        board.set_viewer(viewer("u1"));
        board.open(&resolver(0, Some("10"))).await.unwrap();
        match board.view() {
            BoardView::Board {
                heading,
                posting_as,
                post_label,
                placeholder,
                empty_message,
                ..
            } => {
                assert_eq!(heading, "Anúncio #10");
                assert_eq!(posting_as, "Publicando como: Visitante");
                assert_eq!(post_label, "Publicar");
                assert_eq!(placeholder, "O preço é justo? Como é o bairro?");
                assert_eq!(empty_message, Some("Sem comentários. Seja o primeiro!"));
            }
            other => panic!("unexpected view {:?}", other),
        }

        board.set_nickname("Maria1990");
        match board.view() {
            BoardView::Board { posting_as, .. } => {
                assert_eq!(posting_as, "Publicando como: Maria1990")
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[tokio::test]
    async fn post_reply_like_delete_cycle() {
        let store = Arc::new(MemoryStore::new());
        let mut board = BoardController::new(store.clone(), Preferences::default(), options());
        board.set_viewer(viewer("u1"));
        board.set_nickname("HouseHunter_PT");
        board.open(&resolver(0, Some("10"))).await.unwrap();

        let topics: BTreeSet<Topic> = [Topic::Price].into_iter().collect();
        assert_eq!(
            board.post("Photos make it look bigger.", topics).await.unwrap(),
            CommandOutcome::Applied
        );
        let root_id = board.session().forest()[0].id().to_string();
        assert_eq!(board.session().forest()[0].record.nickname, "HouseHunter_PT");

        board.reply(&root_id, "Same impression.", BTreeSet::new()).await.unwrap();
        assert_eq!(board.session().forest()[0].children.len(), 1);

        board.toggle_like(&root_id).await.unwrap();
        assert_eq!(board.session().forest()[0].record.like_count, 1);
        board.toggle_like(&root_id).await.unwrap();
        assert_eq!(board.session().forest()[0].record.like_count, 0);

        assert!(board.toggle_like("999").await.unwrap_err().is_not_found());

        board.set_viewer(viewer("u2"));
        assert_eq!(board.delete(&root_id).await.unwrap_err(), BoardError::Forbidden);
        board.set_viewer(viewer("u1"));
        board.delete(&root_id).await.unwrap();
        // the reply goes with its parent
        assert!(board.session().forest().is_empty());
    }

    #[tokio::test]
    async fn store_failure_shows_error_view() {
        let mut board = BoardController::new(Arc::new(BrokenStore), Preferences::default(), options());
        board.set_viewer(viewer("u1"));
        board.open(&resolver(0, Some("10"))).await.unwrap();
        assert_eq!(
            board.view(),
            BoardView::LoadError {
                heading: "Listing #10".into(),
                title: "Apartamento T1",
                message: "Error loading comments.",
            }
        );
        let err = board.post("hi", BTreeSet::new()).await.unwrap_err();
        assert!(matches!(err, BoardError::StoreFailure(_)));
    }
}
