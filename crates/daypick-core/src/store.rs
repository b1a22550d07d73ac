//! Store traits for identities and daily picks.
//!
//! Implemented by storage backends (e.g. `daypick-store-sqlite`). The
//! services in this crate and the HTTP layer depend on these abstractions,
//! not on any concrete backend.
//!
//! Race resolution is the backend's job: the `(owner, day)` key must be a
//! storage-level uniqueness constraint and a like toggle must be a single
//! atomic read-modify-write.

use std::future::Future;

use uuid::Uuid;

use crate::{
  day::DayBucket,
  identity::{Identity, NewIdentity},
  pick::{DailyPick, LikeToggle, NewPick, PickInsert, PickUpdate, PickView},
};

/// Shared error type for a backend implementing both stores.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Abstraction over the identity collection.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IdentityStore: Store {
  /// Insert or update by `external_id`. `created_at` is set on insert and
  /// preserved on update.
  fn upsert_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  fn get_identity<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;
}

/// Abstraction over the daily-pick collection.
pub trait PickStore: Store {
  /// The owner's pick for `day`, if any.
  fn find_pick<'a>(
    &'a self,
    owner_id: &'a str,
    day: DayBucket,
  ) -> impl Future<Output = Result<Option<DailyPick>, Self::Error>> + Send + 'a;

  /// Insert a new pick unless the owner already holds that day, in which
  /// case nothing is written and [`PickInsert::Conflict`] is returned.
  fn insert_pick(
    &self,
    input: NewPick,
  ) -> impl Future<Output = Result<PickInsert, Self::Error>> + Send + '_;

  /// Overwrite the track fields and display name of an existing pick,
  /// leaving its likes, id and timestamp alone. Returns `None` if the pick
  /// no longer exists.
  fn replace_pick(
    &self,
    pick_id: Uuid,
    update: PickUpdate,
  ) -> impl Future<Output = Result<Option<DailyPick>, Self::Error>> + Send + '_;

  /// Delete the owner's pick for `day` along with its likes. Returns whether
  /// a pick was deleted.
  fn delete_pick<'a>(
    &'a self,
    owner_id: &'a str,
    day: DayBucket,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Flip `user_id`'s like on the earliest pick carrying `track_ref`.
  /// Returns `None` if no pick has that track.
  fn toggle_like<'a>(
    &'a self,
    track_ref: &'a str,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<LikeToggle>, Self::Error>> + Send + 'a;

  /// Every pick whose owner exists in the identity store, joined with the
  /// owner's profile image and the pick's like count, in submission order.
  fn collage_rows(
    &self,
  ) -> impl Future<Output = Result<Vec<PickView>, Self::Error>> + Send + '_;
}
