//! The Showwatch tracker: browser-driven listing acquisition, the scrape and
//! notification loops, and the JSON API that manages subscriptions.
//!
//! The binary in `main.rs` wires these together from [`TrackerConfig`]. The
//! pieces are generic over [`showwatch_core::store::TrackerStore`] so tests
//! can run them against an in-memory SQLite store and a scripted browser.

pub mod acquisition;
pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use api::{AppState, router};
pub use config::TrackerConfig;
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
