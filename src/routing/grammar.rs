//! Page grammar and path parsing.
//!
//! # Responsibilities
//! - Recognize the page segment at the end of a raw query
//! - Split off the optional language segment in front of it
//! - Sanitize the language according to the configured variant
//!
//! # Grammar
//! ```text
//! query    := [ language "/" ] page [ "/" ]
//! page     := "" | "index" | "about" | "chapters" | "chapters/" id
//! id       := [0-9a-z-]+        (permissive)
//!           | [0-9]+            (legacy numeric)
//! language := one path segment, no "/"
//! ```
//!
//! # Design Decisions
//! - Explicit ordered alternatives instead of regex: the longest page suffix
//!   wins, and a suffix only counts when it starts on a segment boundary
//! - Any leftover single segment is a language, never an error
//! - Parsing is total and pure: `&str` in, `Result` out

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recognized page keywords, in match priority order.
const KEYWORDS: [(&str, Page); 3] = [
    ("index", Page::Index),
    ("about", Page::About),
    ("chapters", Page::Chapters),
];

const CHAPTERS: &str = "chapters";

/// Selects between the two historical grammars of the front controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarVariant {
    /// Chapter ids match `[0-9a-z-]+`, languages are stripped to `[a-z-]`,
    /// chapters resolve to `/chapters/<id>` on the backend.
    #[default]
    Permissive,
    /// Chapter ids match `[0-9]+`, languages pass through untouched,
    /// chapters resolve to `/node/<id>` on the backend.
    LegacyNumeric,
}

impl GrammarVariant {
    /// Returns true if `id` is a valid chapter id under this variant.
    pub fn accepts_id(self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        match self {
            GrammarVariant::Permissive => id
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase() || b == b'-'),
            GrammarVariant::LegacyNumeric => id.bytes().all(|b| b.is_ascii_digit()),
        }
    }

    /// Reduce a raw language candidate to the token used in backend URLs.
    pub fn sanitize_language(self, raw: &str) -> String {
        match self {
            GrammarVariant::Permissive => raw
                .chars()
                .filter(|c| c.is_ascii_lowercase() || *c == '-')
                .collect(),
            GrammarVariant::LegacyNumeric => raw.to_string(),
        }
    }

    /// Backend path segment that precedes a chapter id.
    pub fn chapter_segment(self) -> &'static str {
        match self {
            GrammarVariant::Permissive => "chapters",
            GrammarVariant::LegacyNumeric => "node",
        }
    }
}

impl fmt::Display for GrammarVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarVariant::Permissive => f.write_str("permissive"),
            GrammarVariant::LegacyNumeric => f.write_str("legacy_numeric"),
        }
    }
}

/// The page part of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// No page keyword; only a language (or nothing) was given.
    Root,
    Index,
    About,
    Chapters,
    /// A single chapter, `chapters/<id>`.
    Chapter(String),
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Root => Ok(()),
            Page::Index => f.write_str("index"),
            Page::About => f.write_str("about"),
            Page::Chapters => f.write_str(CHAPTERS),
            Page::Chapter(id) => write!(f, "{}/{}", CHAPTERS, id),
        }
    }
}

/// A query split into its language and page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub language: String,
    pub page: Page,
}

impl ParsedPath {
    pub fn new(language: impl Into<String>, page: Page) -> Self {
        Self {
            language: language.into(),
            page,
        }
    }
}

/// Serializes back into query form, `language/page` with empty parts omitted.
impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.language.is_empty(), self.page == Page::Root) {
            (true, _) => write!(f, "{}", self.page),
            (false, true) => f.write_str(&self.language),
            (false, false) => write!(f, "{}/{}", self.language, self.page),
        }
    }
}

/// Reasons a query is rejected by the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("{segments} path segments in front of the page, at most one language segment is allowed")]
    TooManySegments { segments: usize },

    #[error("empty language segment in front of the page")]
    EmptyLanguage,
}

/// Parse a raw query into `(language, page)`.
pub fn parse_path(query: &str, variant: GrammarVariant) -> Result<ParsedPath, PathError> {
    let (page, remainder) = match_page_suffix(query, variant);
    let raw_language = language_segment(remainder)?;

    Ok(ParsedPath {
        language: variant.sanitize_language(raw_language),
        page,
    })
}

/// Find the longest page suffix of `query` and return it with the remaining prefix.
///
/// The empty page always matches, so this cannot fail.
fn match_page_suffix(query: &str, variant: GrammarVariant) -> (Page, &str) {
    let body = query.strip_suffix('/').unwrap_or(query);

    let (head, last) = match body.rfind('/') {
        Some(pos) => (Some(&body[..pos]), &body[pos + 1..]),
        None => (None, body),
    };

    // chapters/<id> is the longest alternative, try it first.
    if let Some(head) = head {
        let (before, prev) = match head.rfind('/') {
            Some(pos) => (&head[..=pos], &head[pos + 1..]),
            None => ("", head),
        };
        if prev == CHAPTERS && variant.accepts_id(last) {
            return (Page::Chapter(last.to_string()), before);
        }
    }

    for (keyword, page) in KEYWORDS.iter() {
        if last == *keyword {
            let remainder = &body[..body.len() - last.len()];
            return (page.clone(), remainder);
        }
    }

    (Page::Root, body)
}

/// Validate the prefix left in front of the page and extract the language candidate.
///
/// Accepted shapes are `""`, `"seg"` and `"seg/"`.
fn language_segment(remainder: &str) -> Result<&str, PathError> {
    if remainder.is_empty() {
        return Ok("");
    }

    let segment = remainder.strip_suffix('/').unwrap_or(remainder);
    if segment.contains('/') {
        return Err(PathError::TooManySegments {
            segments: segment.split('/').count(),
        });
    }
    if segment.is_empty() {
        return Err(PathError::EmptyLanguage);
    }

    Ok(segment)
}
