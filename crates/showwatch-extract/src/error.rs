//! Error type for `showwatch-extract`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid selector {selector:?}: {reason}")]
  Selector { selector: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
