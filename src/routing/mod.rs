//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Raw query ("pt-br/chapters/4")
//!     → grammar.rs (page suffix match, language split, sanitize)
//!     → router.rs (page kind → backend URL)
//!     → Return: Found(url) or NotFound
//! ```
//!
//! # Design Decisions
//! - Router built from config at startup, immutable at runtime
//! - No regex: the grammar is a fixed set of ordered alternatives
//! - Deterministic: same input always yields the same decision
//! - Grammar variant is data, not a second code path

pub mod grammar;
pub mod router;

pub use grammar::{parse_path, GrammarVariant, Page, ParsedPath, PathError};
pub use router::{route, PathRouter, RouteDecision};
