//! Track references and the metadata-resolver seam.

use std::{collections::HashMap, future::Future};

use serde::Serialize;
use thiserror::Error;

use crate::{Error, Result, pick::TrackMetadata};

/// Length of a Spotify base-62 track id.
const TRACK_ID_LEN: usize = 22;

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("track {0} not found")]
  NotFound(String),

  #[error("track lookup failed: {0}")]
  Upstream(String),
}

/// Resolves a track reference to its title, artists and cover art.
pub trait TrackResolver: Send + Sync {
  fn resolve<'a>(
    &'a self,
    track_ref: &'a str,
  ) -> impl Future<Output = Result<TrackMetadata, ResolveError>> + Send + 'a;
}

/// Reduce a pasted track link to its bare track id.
///
/// Accepts `https://open.spotify.com/track/<id>?si=…`, `spotify:track:<id>`
/// and a bare id. Anything else is returned trimmed but otherwise unchanged,
/// leaving the verdict to the resolver. Returns `None` for blank input.
pub fn normalize_track_ref(input: &str) -> Option<String> {
  let input = input.trim();
  if input.is_empty() {
    return None;
  }

  let tail = input
    .split_once("spotify:track:")
    .or_else(|| input.split_once("track/"))
    .map(|(_, rest)| rest);

  if let Some(rest) = tail {
    let id: String = rest
      .chars()
      .take_while(char::is_ascii_alphanumeric)
      .take(TRACK_ID_LEN)
      .collect();
    if id.len() == TRACK_ID_LEN {
      return Some(id);
    }
  }

  Some(input.to_owned())
}

/// A resolved track, shown to a user before they submit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPreview {
  /// The normalised reference a submission would store.
  pub track_ref: String,
  #[serde(flatten)]
  pub track:     TrackMetadata,
}

/// Normalise `input` and look it up without touching any store.
pub async fn preview_track<R: TrackResolver>(resolver: &R, input: &str) -> Result<TrackPreview> {
  let track_ref = normalize_track_ref(input)
    .ok_or_else(|| Error::InvalidInput("trackRef must not be empty".into()))?;
  let track = resolver.resolve(&track_ref).await.map_err(|e| match e {
    ResolveError::NotFound(r) => Error::NotFound(format!("track {r} not found")),
    ResolveError::Upstream(msg) => Error::UpstreamUnavailable(msg),
  })?;
  Ok(TrackPreview { track_ref, track })
}

/// An in-memory resolver over a fixed catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
  tracks: HashMap<String, TrackMetadata>,
}

impl StaticResolver {
  pub fn new() -> Self { Self::default() }

  pub fn with_track(mut self, track_ref: impl Into<String>, track: TrackMetadata) -> Self {
    self.tracks.insert(track_ref.into(), track);
    self
  }
}

impl TrackResolver for StaticResolver {
  async fn resolve(&self, track_ref: &str) -> Result<TrackMetadata, ResolveError> {
    self
      .tracks
      .get(track_ref)
      .cloned()
      .ok_or_else(|| ResolveError::NotFound(track_ref.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

  #[test]
  fn open_url_with_query_string() {
    let link = format!("https://open.spotify.com/track/{ID}?si=abc123");
    assert_eq!(normalize_track_ref(&link).as_deref(), Some(ID));
  }

  #[test]
  fn spotify_uri() {
    let uri = format!("spotify:track:{ID}");
    assert_eq!(normalize_track_ref(&uri).as_deref(), Some(ID));
  }

  #[test]
  fn bare_id_and_opaque_refs_pass_through() {
    assert_eq!(normalize_track_ref(ID).as_deref(), Some(ID));
    assert_eq!(normalize_track_ref("  T1 ").as_deref(), Some("T1"));
  }

  #[test]
  fn short_id_after_prefix_is_left_alone() {
    assert_eq!(
      normalize_track_ref("spotify:track:short").as_deref(),
      Some("spotify:track:short")
    );
  }

  #[test]
  fn blank_is_none() {
    assert_eq!(normalize_track_ref("   "), None);
  }

  #[tokio::test]
  async fn static_resolver_lookup() {
    let resolver = StaticResolver::new().with_track("T1", TrackMetadata {
      title:     "Song A".into(),
      artists:   vec!["Band".into()],
      cover_url: "url1".into(),
    });
    assert_eq!(resolver.resolve("T1").await.unwrap().title, "Song A");
    assert!(matches!(
      resolver.resolve("T9").await,
      Err(ResolveError::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn preview_normalises_before_lookup() {
    let resolver = StaticResolver::new().with_track(ID, TrackMetadata {
      title:     "Song A".into(),
      artists:   vec!["Band".into()],
      cover_url: "url1".into(),
    });
    let link = format!("https://open.spotify.com/track/{ID}?si=x");

    let preview = preview_track(&resolver, &link).await.unwrap();
    assert_eq!(preview.track_ref, ID);
    assert_eq!(preview.track.title, "Song A");

    assert!(matches!(
      preview_track(&resolver, "T9").await,
      Err(Error::NotFound(_))
    ));
    assert!(matches!(
      preview_track(&resolver, "  ").await,
      Err(Error::InvalidInput(_))
    ));
  }
}
