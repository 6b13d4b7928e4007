//! Friendly-URL front controller.
//!
//! Turns paths like `/pt-br/chapters/4` into fetches against a CMS backend
//! and streams the result back.

pub mod config;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::FrontConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{parse_path, route, GrammarVariant, PathRouter, RouteDecision};
