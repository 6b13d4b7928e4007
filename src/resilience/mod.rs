//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend fetch fails:
//!     → retries.rs (is the failure retryable? attempts left?)
//!     → backoff.rs (how long to wait before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - Jittered backoff prevents thundering herd

pub mod backoff;
pub mod retries;

pub use backoff::{backoff_for, calculate_backoff};
pub use retries::{is_retryable_error, is_retryable_status, max_attempts};
