use crate::models::{ListingId, ListingInfo};

/// Path segment that precedes the numeric listing id in listing URLs,
/// e.g. `https://www.idealista.pt/imovel/34683501/`.
pub const LISTING_PATH_MARKER: &str = "/imovel/";

/// Extracts the listing id from a page URL.
pub fn parse_listing_id(url: &str) -> Option<ListingId> {
    let (_, rest) = url.split_once(LISTING_PATH_MARKER)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    ListingId::new(digits).ok()
}

impl ListingInfo {
    /// Builds what the page agent reports: the id from the URL, the title from
    /// the main heading, falling back to the document title.
    pub fn from_page(url: &str, heading: Option<&str>, document_title: &str) -> Self {
        let title = heading
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| document_title.trim())
            .to_string();

        Self {
            id: parse_listing_id(url),
            title,
        }
    }

    pub fn not_found() -> Self {
        Self {
            id: None,
            title: String::new(),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_comes_from_the_imovel_segment() {
        let id = parse_listing_id("https://www.idealista.pt/imovel/34683501/?xtmc=1");
        assert_eq!(id.unwrap().as_str(), "34683501");
        assert_eq!(
            parse_listing_id("https://www.idealista.pt/imovel/99").unwrap().as_str(),
            "99"
        );
    }

    #[test]
    fn non_listing_pages_have_no_id() {
        assert!(parse_listing_id("https://www.idealista.pt/comprar-casas/lisboa/").is_none());
        assert!(parse_listing_id("https://www.idealista.pt/imovel/abc/").is_none());
        assert!(parse_listing_id("").is_none());
    }

    #[test]
    fn title_prefers_heading() {
        let info = ListingInfo::from_page(
            "https://www.idealista.pt/imovel/1/",
            Some("  Apartamento T2 em Arroios  "),
            "idealista",
        );
        assert_eq!(info.title, "Apartamento T2 em Arroios");
        assert!(info.is_detected());

        let fallback = ListingInfo::from_page("https://x/imovel/1/", Some(" "), " Doc title ");
        assert_eq!(fallback.title, "Doc title");
    }
}
