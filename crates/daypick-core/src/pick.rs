//! Daily picks and their read models.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, day::DayBucket};

// ─── Track metadata ──────────────────────────────────────────────────────────

/// What the track resolver knows about a track reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
  pub title:     String,
  /// Ordered artist names.
  pub artists:   Vec<String>,
  pub cover_url: String,
}

impl TrackMetadata {
  /// A pick needs a title, at least one artist and a cover image.
  pub fn validate(&self, track_ref: &str) -> Result<()> {
    let missing = if self.title.trim().is_empty() {
      Some("title")
    } else if self.artists.iter().all(|a| a.trim().is_empty()) {
      Some("artists")
    } else if self.cover_url.trim().is_empty() {
      Some("cover image")
    } else {
      None
    };
    match missing {
      Some(field) => Err(Error::InvalidTrackReference(format!(
        "track {track_ref} has no {field}"
      ))),
      None => Ok(()),
    }
  }
}

// ─── DailyPick ───────────────────────────────────────────────────────────────

/// A single owner's track for one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPick {
  pub pick_id:            Uuid,
  /// Opaque external track identifier.
  pub track_ref:          String,
  pub title:              String,
  pub artists:            Vec<String>,
  pub cover_url:          String,
  /// Set on creation; a same-day replacement keeps the original value.
  pub submitted_at:       DateTime<Utc>,
  pub day:                DayBucket,
  /// Weak reference to [`crate::identity::Identity::external_id`].
  pub owner_id:           String,
  /// Snapshot of the owner's display name at submission time.
  pub owner_display_name: String,
  pub liked_by:           BTreeSet<String>,
}

impl DailyPick {
  pub fn like_count(&self) -> usize { self.liked_by.len() }

  pub fn artists_display(&self) -> String { self.artists.join(", ") }
}

/// Input to [`crate::store::PickStore::insert_pick`]. The store assigns
/// `pick_id` and derives `day` from `submitted_at`.
#[derive(Debug, Clone)]
pub struct NewPick {
  pub owner_id:           String,
  pub owner_display_name: String,
  pub track_ref:          String,
  pub track:              TrackMetadata,
  pub submitted_at:       DateTime<Utc>,
}

/// The fields overwritten by a same-day replacement.
#[derive(Debug, Clone)]
pub struct PickUpdate {
  pub owner_display_name: String,
  pub track_ref:          String,
  pub track:              TrackMetadata,
}

/// Outcome of an insert guarded by the `(owner, day)` uniqueness key.
#[derive(Debug, Clone)]
pub enum PickInsert {
  Inserted(DailyPick),
  /// Another pick already holds the owner's slot for that day.
  Conflict,
}

// ─── Likes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeState {
  Liked,
  Unliked,
}

/// The state after a toggle, with the new like count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
  pub result: LikeState,
  pub count:  usize,
}

// ─── Collage read model ──────────────────────────────────────────────────────

/// A pick joined with its owner's live profile image and its like count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickView {
  pub pick_id:            Uuid,
  pub track_ref:          String,
  pub title:              String,
  pub artists:            Vec<String>,
  pub cover_url:          String,
  pub owner_id:           String,
  pub owner_display_name: String,
  pub submitted_at:       DateTime<Utc>,
  pub profile_image_url:  Option<String>,
  pub like_count:         usize,
}

/// All picks of one day, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
  pub day:   DayBucket,
  pub picks: Vec<PickView>,
}
