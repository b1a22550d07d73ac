//! Like toggling.
//!
//! A toggle is a flip, not a set: calling it twice for the same user and
//! track leaves the like set as it was. Retrying a toggle is therefore not
//! idempotent, which is the intended "heart button" behaviour.

use tracing::debug;

use crate::{
  Error, Result,
  pick::LikeToggle,
  resolve::normalize_track_ref,
  store::PickStore,
};

pub struct LikeToggler<'a, S> {
  store: &'a S,
}

impl<'a, S: PickStore> LikeToggler<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Likes target the pick by track, not by day, so old picks stay likeable.
  pub async fn toggle(&self, track_ref: &str, user_id: &str) -> Result<LikeToggle> {
    let track_ref = normalize_track_ref(track_ref)
      .ok_or_else(|| Error::InvalidInput("trackRef must not be empty".into()))?;
    let user_id = user_id.trim();
    if user_id.is_empty() {
      return Err(Error::InvalidInput("userId must not be empty".into()));
    }

    let toggle = self
      .store
      .toggle_like(&track_ref, user_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::NotFound(format!("track {track_ref} not found")))?;

    debug!(%track_ref, user_id, result = ?toggle.result, count = toggle.count, "like toggled");
    Ok(toggle)
  }
}
