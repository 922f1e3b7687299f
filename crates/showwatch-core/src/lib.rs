//! Core types and pipeline logic for the Showwatch listing tracker.
//!
//! No HTTP, browser or database code lives here. The diff engine, the
//! subscription matcher, and the message templates are pure functions over
//! the domain types. Storage backends implement [`store::TrackerStore`].

pub mod diff;
pub mod error;
pub mod listing;
pub mod listing_url;
pub mod matcher;
pub mod message;
pub mod notification;
pub mod similarity;
pub mod store;
pub mod subscription;
pub mod theater;
pub mod user;

pub use error::{Error, Result};
