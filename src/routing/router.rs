//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Parse the raw query with the configured grammar
//! - Map the page kind to a backend URL
//! - Return the resolved URL or an explicit NotFound
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Malformed and unknown paths collapse into the same NotFound
//! - The backend base URL is concatenated as-is; the config layer validates it

use serde::Serialize;

use crate::routing::grammar::{parse_path, GrammarVariant, Page, ParsedPath};

/// Outcome of routing a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "url", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Fetch this backend URL and stream it back.
    Found(String),
    NotFound,
}

/// Resolves friendly paths to backend URLs.
#[derive(Debug, Clone)]
pub struct PathRouter {
    backend_url: String,
    variant: GrammarVariant,
}

impl PathRouter {
    pub fn new(backend_url: impl Into<String>, variant: GrammarVariant) -> Self {
        Self {
            backend_url: backend_url.into(),
            variant,
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn variant(&self) -> GrammarVariant {
        self.variant
    }

    /// Route a raw query (request path without the leading slash).
    pub fn route(&self, query: &str) -> RouteDecision {
        match parse_path(query, self.variant) {
            Ok(parsed) => self.resolve(&parsed),
            Err(e) => {
                tracing::debug!(query = %query, reason = %e, "Query rejected by grammar");
                RouteDecision::NotFound
            }
        }
    }

    /// Build the backend URL for an already parsed path.
    pub fn resolve(&self, parsed: &ParsedPath) -> RouteDecision {
        let language = parsed.language.as_str();

        let page = match &parsed.page {
            Page::Root if !language.is_empty() => Page::Index,
            page => page.clone(),
        };

        let mut url = self.backend_url.clone();
        if !language.is_empty() {
            url.push('/');
            url.push_str(language);
        }

        match page {
            Page::Index | Page::About | Page::Chapters => RouteDecision::Found(url),
            Page::Chapter(id) => {
                url.push('/');
                url.push_str(self.variant.chapter_segment());
                url.push('/');
                url.push_str(&id);
                RouteDecision::Found(url)
            }
            Page::Root => RouteDecision::NotFound,
        }
    }
}

/// Route `query` against `backend_url` using the given grammar.
pub fn route(query: &str, backend_url: &str, variant: GrammarVariant) -> RouteDecision {
    PathRouter::new(backend_url, variant).route(query)
}
