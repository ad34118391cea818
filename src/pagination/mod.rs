//! Pagination module
//!
//! Enumerates every page of a paginated listing until a termination condition
//! fires.
//!
//! # Overview
//!
//! A run is a small state machine:
//!
//! ```text
//! Fetching ──ok──▶ Accumulating ──full page──▶ Fetching (page + 1)
//!    │                  │
//!    │                  ├─ empty page ─────▶ Terminated(EmptyPage)
//!    │                  └─ short page ─────▶ Terminated(ShortPage)
//!    └─fail─▶ BackoffWait ──▶ Fetching (same page)
//!                  └─ threshold ───────────▶ Terminated(ConsecutiveFailures)
//! page > max_pages ────────────────────────▶ Terminated(MaxPagesReached)
//! ```

mod controller;
mod source;
mod types;

pub use controller::PaginationController;
pub use source::PageSource;
pub use types::{
    Collection, CollectionState, PaginationConfig, TerminationReason,
    DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
};
