use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Topic;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pt,
}

impl Language {
    /// Picks a language from a locale tag such as `pt-PT` or `pt_BR.UTF-8`.
    pub fn detect(tag: Option<&str>) -> Self {
        match tag {
            Some(t) if t.trim().to_ascii_lowercase().starts_with("pt") => Language::Pt,
            _ => Language::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Pt => "pt",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "pt" => Ok(Language::Pt),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    LoadingId,
    DetectingListing,
    PostingAs,
    AnonUser,
    NoComments,
    Post,
    Placeholder,
    NoListingFound,
    NavigateMessage,
    ListingPrefix,
    Guest,
    ErrorLoading,
    SignInRequired,
}

pub fn tr(lang: Language, key: Text) -> &'static str {
    match lang {
        Language::En => match key {
            Text::LoadingId => "Loading ID...",
            Text::DetectingListing => "Detecting listing...",
            Text::PostingAs => "Posting as:",
            Text::AnonUser => "AnonUser",
            Text::NoComments => "No comments yet. Be the first!",
            Text::Post => "Post",
            Text::Placeholder => "Is the price fair? How is the neighborhood?",
            Text::NoListingFound => "No Listing Found",
            Text::NavigateMessage => "Please navigate to an idealista listing.",
            Text::ListingPrefix => "Listing #",
            Text::Guest => "Guest",
            Text::ErrorLoading => "Error loading comments.",
            Text::SignInRequired => "Sign in to post.",
        },
        Language::Pt => match key {
            Text::LoadingId => "A carregar ID...",
            Text::DetectingListing => "A detetar anúncio...",
            Text::PostingAs => "Publicando como:",
            Text::AnonUser => "UtilizadorAnónimo",
            Text::NoComments => "Sem comentários. Seja o primeiro!",
            Text::Post => "Publicar",
            Text::Placeholder => "O preço é justo? Como é o bairro?",
            Text::NoListingFound => "Anúncio não encontrado",
            Text::NavigateMessage => "Por favor navegue para um anúncio do idealista.",
            Text::ListingPrefix => "Anúncio #",
            Text::Guest => "Visitante",
            Text::ErrorLoading => "Erro ao carregar comentários.",
            Text::SignInRequired => "Inicie sessão para publicar.",
        },
    }
}

impl Topic {
    pub fn label(&self, lang: Language) -> &'static str {
        match (lang, self) {
            (Language::En, Topic::Price) => "Price",
            (Language::En, Topic::Noise) => "Noise",
            (Language::En, Topic::Security) => "Security",
            (Language::En, Topic::Accesses) => "Accesses",
            (Language::Pt, Topic::Price) => "Preço",
            (Language::Pt, Topic::Noise) => "Ruído",
            (Language::Pt, Topic::Security) => "Segurança",
            (Language::Pt, Topic::Accesses) => "Acessos",
        }
    }
}
