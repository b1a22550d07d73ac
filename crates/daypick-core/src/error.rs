//! Error types for `daypick-core`.

use thiserror::Error;

use crate::day::DayBucket;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or malformed caller-supplied fields.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// The track resolver could not produce usable metadata.
  #[error("invalid track reference: {0}")]
  InvalidTrackReference(String),

  #[error("not found: {0}")]
  NotFound(String),

  /// A collaborator (track metadata, identity provider) failed.
  #[error("upstream unavailable: {0}")]
  UpstreamUnavailable(String),

  /// Concurrent first submissions kept colliding and no winner could be
  /// re-read. Ordinary collisions resolve to `kept_existing` instead.
  #[error("conflicting submission for {owner_id} on {day}")]
  StoreConflict { owner_id: String, day: DayBucket },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
