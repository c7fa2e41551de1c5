use adapter::{
    BoardController, BoardView, CommentStore, ControllerOptions, ListingResolver,
};
use async_trait::async_trait;
use domain::{
    BoardError, CommentNode, CommentRecord, Language, LikeDelta, ListingId, ListingInfo,
    NewComment, Preferences, Topic, Viewer,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::sync::Arc;

const BASE_URL: &str = "http://127.0.0.1:3000";
const PAGE_URL: &str = "https://www.idealista.pt/imovel/34683501/";
const PAGE_HEADING: &str = "Apartamento T2 em Arroios, Lisboa";

#[derive(Deserialize)]
struct SignInResponse {
    token: String,
    viewer: Viewer,
}

/// The board API seen as a comment store.
struct HttpStore {
    client: reqwest::Client,
    token: String,
}

impl HttpStore {
    fn url(path: &str) -> String {
        format!("{}{}", BASE_URL, path)
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BoardError> {
        let status = resp.status();
        if status.is_success() {
            return resp.json().await.map_err(BoardError::store);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => BoardError::Unauthenticated,
            403 => BoardError::Forbidden,
            404 => BoardError::CommentNotFound(body),
            400 => BoardError::InvalidInput(body),
            _ => BoardError::StoreFailure(format!("{}: {}", status, body)),
        })
    }
}

#[async_trait]
impl CommentStore for HttpStore {
    async fn fetch_by_listing(
        &self,
        listing_id: &ListingId,
    ) -> Result<Vec<CommentRecord>, BoardError> {
        let resp = self
            .client
            .get(Self::url(&format!("/api/listings/{}/records", listing_id)))
            .send()
            .await
            .map_err(BoardError::store)?;
        Self::read(resp).await
    }

    async fn create(&self, comment: NewComment) -> Result<CommentRecord, BoardError> {
        let resp = self
            .client
            .post(Self::url(&format!("/api/listings/{}/comments", comment.listing_id)))
            .bearer_auth(&self.token)
            .json(&json!({
                "text": comment.text,
                "topics": comment.topics,
                "parent_id": comment.parent_id,
                "nickname": comment.nickname,
            }))
            .send()
            .await
            .map_err(BoardError::store)?;
        Self::read(resp).await
    }

    async fn delete(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        _requester_id: &str,
    ) -> Result<(), BoardError> {
        let resp = self
            .client
            .delete(Self::url(&format!(
                "/api/listings/{}/comments/{}",
                listing_id, comment_id
            )))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(BoardError::store)?;
        Self::read::<serde_json::Value>(resp).await.map(|_| ())
    }

    async fn set_like(
        &self,
        listing_id: &ListingId,
        comment_id: &str,
        _viewer_id: &str,
        liked: bool,
    ) -> Result<LikeDelta, BoardError> {
        let resp = self
            .client
            .post(Self::url(&format!(
                "/api/listings/{}/comments/{}/like",
                listing_id, comment_id
            )))
            .bearer_auth(&self.token)
            .json(&json!({ "liked": liked }))
            .send()
            .await
            .map_err(BoardError::store)?;
        Self::read(resp).await
    }
}

/// Stands in for the page agent: asks the server to parse a fixed page.
struct FixedPage {
    client: reqwest::Client,
}

#[async_trait]
impl ListingResolver for FixedPage {
    async fn resolve(&self) -> Result<ListingInfo, BoardError> {
        let resp = self
            .client
            .post(HttpStore::url("/api/listings/resolve"))
            .json(&json!({
                "url": PAGE_URL,
                "heading": PAGE_HEADING,
                "document_title": "idealista",
            }))
            .send()
            .await
            .map_err(|e| BoardError::ResolverUnavailable(e.to_string()))?;
        resp.json()
            .await
            .map_err(|e| BoardError::ResolverUnavailable(e.to_string()))
    }
}

fn print_forest(forest: &[CommentNode], lang: Language) {
    let mut stack: Vec<(&CommentNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        let r = &node.record;
        let topics: Vec<&str> = r.topics.iter().map(|t| t.label(lang)).collect();
        println!(
            "{}- {} [{}] ♥{} {}",
            "  ".repeat(depth + 3),
            r.nickname,
            topics.join(", "),
            r.like_count,
            r.text
        );
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
}

fn print_view(view: &BoardView<'_>, lang: Language) {
    match view {
        BoardView::Detecting { message } => println!("   -> {}", message),
        BoardView::NoListing { title, message } => println!("   -> {}: {}", title, message),
        BoardView::Loading { heading, title, message } => {
            println!("   -> {} {} ({})", heading, title, message)
        }
        BoardView::LoadError { heading, title, message } => {
            println!("   -> {} {}: {}", heading, title, message)
        }
        BoardView::Board {
            heading,
            title,
            forest,
            empty_message,
            posting_as,
            post_label,
            placeholder,
            ..
        } => {
            println!("   -> {} {}", heading, title);
            println!("   -> {} [{}: {}]", posting_as, post_label, placeholder);
            match empty_message {
                Some(m) => println!("      {}", m),
                None => print_forest(forest, lang),
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    let lang = Language::detect(std::env::var("LANG").ok().as_deref());
    println!("Starting Casanotes test client...");

    println!("\n[1/5] Signing in...");
    let signed_in: SignInResponse = client
        .post(HttpStore::url("/api/session"))
        .json(&json!({ "display_name": "Ferris" }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("   -> Viewer id: {}", signed_in.viewer.id);

    let store = Arc::new(HttpStore {
        client: client.clone(),
        token: signed_in.token,
    });
    let mut board = BoardController::new(
        store,
        Preferences::with_language(lang),
        ControllerOptions::default(),
    );
    board.set_viewer(Some(signed_in.viewer));
    board.set_nickname("Ferris");

    println!("\n[2/5] Detecting listing...");
    if let Err(e) = board.open(&FixedPage { client }).await {
        println!("   -> ❌ {}", e);
        print_view(&board.view(), lang);
        return Ok(());
    }
    print_view(&board.view(), lang);

    println!("\n[3/5] Posting a comment...");
    let topics = [Topic::Price, Topic::Noise].into_iter().collect();
    board
        .post("Visited yesterday. The photos make the living room look bigger.", topics)
        .await?;
    let root_id = match board.session().forest().last() {
        Some(n) => n.id().to_string(),
        None => {
            println!("   -> ❌ Comment did not show up");
            return Ok(());
        }
    };

    println!("\n[4/5] Replying and liking...");
    board
        .reply(&root_id, "Does anyone know if the street is noisy at night?", Default::default())
        .await?;
    board.toggle_like(&root_id).await?;

    println!("\n[5/5] Current board:");
    print_view(&board.view(), lang);

    Ok(())
}
