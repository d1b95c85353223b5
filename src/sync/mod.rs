//! Data synchronization and caching.
//!
//! This module decides when previously fetched pages can be trusted, when to
//! go back to the network, how to retry and fall back across data sources,
//! and how to absorb upstream changes in the background.
//!
//! # Architecture
//!
//! ```text
//! SyncController ──► FetchOrchestrator ──► FallbackChain ──► DataSource (primary, legacy, sample)
//!       │                   │
//!       │                   ▼
//!       │              CacheStore ◄── FreshnessMonitor
//!       ▼
//!     view()  (search and sort over cached records)
//! ```
//!
//! Everything is generic over [`Record`], so a single implementation serves
//! every list page.

mod controller;
mod fallback;
mod key;
mod monitor;
mod orchestrator;
mod pagination;
mod policy;
mod source;
mod status;
mod store;
#[cfg(test)]
mod testing;
mod traits;
mod view;

pub use controller::{LoadState, SyncController, SyncSettings};
pub use fallback::FallbackChain;
pub use pagination::{FilterField, Filters, Window};
pub use policy::RetryPolicy;
pub use source::{DataSource, FetchRequest, RawPage, SourceError};
pub use status::SyncStatus;
pub use traits::{Record, SortField, SortKey, SourceKind};
pub use view::{parse_timestamp, view, SortSpec};
