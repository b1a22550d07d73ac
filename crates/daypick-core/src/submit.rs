//! The submission coordinator: one pick per owner per UTC day.
//!
//! Metadata is resolved before the store is touched. The check-then-insert
//! race between two first submissions is settled by the store's `(owner,
//! day)` uniqueness key; the loser re-reads and reports the winner as
//! [`SubmitOutcome::KeptExisting`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  day::DayBucket,
  identity::Caller,
  pick::{DailyPick, NewPick, PickInsert, PickUpdate, TrackMetadata},
  resolve::{ResolveError, TrackResolver, normalize_track_ref},
  store::PickStore,
};

/// Insert attempts before a persistent collision is reported.
const MAX_INSERT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
  Created,
  /// The owner already has a pick today and did not ask to replace it.
  KeptExisting,
  Replaced,
}

/// The outcome of [`SubmissionCoordinator::submit`] with the pick as stored.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub result: SubmitOutcome,
  pub pick:   DailyPick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
  Deleted,
  NotFound,
}

pub struct SubmissionCoordinator<'a, S, R> {
  store:    &'a S,
  resolver: &'a R,
}

impl<'a, S, R> SubmissionCoordinator<'a, S, R>
where
  S: PickStore,
  R: TrackResolver,
{
  pub fn new(store: &'a S, resolver: &'a R) -> Self { Self { store, resolver } }

  pub async fn submit(
    &self,
    caller: &Caller,
    track_ref: &str,
    explicit_replace: bool,
  ) -> Result<Submission> {
    self
      .submit_at(caller, track_ref, explicit_replace, Utc::now())
      .await
  }

  /// [`submit`](Self::submit) with an explicit clock reading.
  pub async fn submit_at(
    &self,
    caller: &Caller,
    track_ref: &str,
    explicit_replace: bool,
    now: DateTime<Utc>,
  ) -> Result<Submission> {
    caller.validate()?;
    let track_ref = normalize_track_ref(track_ref)
      .ok_or_else(|| Error::InvalidInput("trackRef must not be empty".into()))?;
    let track = self.resolve(&track_ref).await?;
    let day = DayBucket::of(now);

    for attempt in 1..=MAX_INSERT_ATTEMPTS {
      if let Some(existing) = self
        .store
        .find_pick(&caller.external_id, day)
        .await
        .map_err(Error::store)?
      {
        if !explicit_replace {
          debug!(owner_id = %caller.external_id, %day, "keeping existing pick");
          return Ok(Submission {
            result: SubmitOutcome::KeptExisting,
            pick:   existing,
          });
        }

        let update = PickUpdate {
          owner_display_name: caller.display_name.clone(),
          track_ref:          track_ref.clone(),
          track:              track.clone(),
        };
        match self
          .store
          .replace_pick(existing.pick_id, update)
          .await
          .map_err(Error::store)?
        {
          Some(pick) => {
            info!(owner_id = %caller.external_id, %day, track_ref = %pick.track_ref, "pick replaced");
            return Ok(Submission {
              result: SubmitOutcome::Replaced,
              pick,
            });
          }
          // Deleted between the read and the write; start over.
          None => continue,
        }
      }

      let input = NewPick {
        owner_id:           caller.external_id.clone(),
        owner_display_name: caller.display_name.clone(),
        track_ref:          track_ref.clone(),
        track:              track.clone(),
        submitted_at:       now,
      };
      match self.store.insert_pick(input).await.map_err(Error::store)? {
        PickInsert::Inserted(pick) => {
          info!(owner_id = %caller.external_id, %day, track_ref = %pick.track_ref, "pick created");
          return Ok(Submission {
            result: SubmitOutcome::Created,
            pick,
          });
        }
        PickInsert::Conflict => {
          debug!(owner_id = %caller.external_id, %day, attempt, "lost first-submission race");
          if let Some(winner) = self
            .store
            .find_pick(&caller.external_id, day)
            .await
            .map_err(Error::store)?
          {
            // A lost race reports the winner, even with explicit_replace.
            return Ok(Submission {
              result: SubmitOutcome::KeptExisting,
              pick:   winner,
            });
          }
        }
      }
    }

    warn!(owner_id = %caller.external_id, %day, "giving up after repeated submission conflicts");
    Err(Error::StoreConflict {
      owner_id: caller.external_id.clone(),
      day,
    })
  }

  /// Delete the caller's pick for today. Earlier days are never touched.
  pub async fn delete(&self, caller: &Caller) -> Result<DeleteOutcome> {
    self.delete_at(caller, Utc::now()).await
  }

  pub async fn delete_at(
    &self,
    caller: &Caller,
    now: DateTime<Utc>,
  ) -> Result<DeleteOutcome> {
    if caller.external_id.trim().is_empty() {
      return Err(Error::InvalidInput("ownerId must not be empty".into()));
    }
    let day = DayBucket::of(now);
    let deleted = self
      .store
      .delete_pick(&caller.external_id, day)
      .await
      .map_err(Error::store)?;

    if deleted {
      info!(owner_id = %caller.external_id, %day, "pick deleted");
      Ok(DeleteOutcome::Deleted)
    } else {
      Ok(DeleteOutcome::NotFound)
    }
  }

  /// The owner's pick for today, if any.
  pub async fn today(&self, owner_id: &str) -> Result<Option<DailyPick>> {
    self.today_at(owner_id, Utc::now()).await
  }

  pub async fn today_at(
    &self,
    owner_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<DailyPick>> {
    self
      .store
      .find_pick(owner_id, DayBucket::of(now))
      .await
      .map_err(Error::store)
  }

  async fn resolve(&self, track_ref: &str) -> Result<TrackMetadata> {
    let track = self
      .resolver
      .resolve(track_ref)
      .await
      .map_err(|e| match e {
        ResolveError::NotFound(r) => {
          Error::InvalidTrackReference(format!("track {r} could not be resolved"))
        }
        ResolveError::Upstream(msg) => Error::UpstreamUnavailable(msg),
      })?;
    track.validate(track_ref)?;
    Ok(track)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::TimeZone;
  use uuid::Uuid;

  use super::*;
  use crate::{
    pick::{LikeToggle, PickView},
    resolve::StaticResolver,
    store::Store,
  };

  /// A store whose reads are scripted and whose inserts either always
  /// collide or always succeed.
  struct Scripted {
    finds:           Mutex<VecDeque<Option<DailyPick>>>,
    always_conflict: bool,
    inserts:         AtomicUsize,
    replaces:        AtomicUsize,
  }

  impl Scripted {
    fn new(finds: Vec<Option<DailyPick>>, always_conflict: bool) -> Self {
      Self {
        finds: Mutex::new(finds.into()),
        always_conflict,
        inserts: AtomicUsize::new(0),
        replaces: AtomicUsize::new(0),
      }
    }
  }

  impl Store for Scripted {
    type Error = Infallible;
  }

  impl PickStore for Scripted {
    async fn find_pick(
      &self,
      _owner_id: &str,
      _day: DayBucket,
    ) -> Result<Option<DailyPick>, Infallible> {
      Ok(self.finds.lock().unwrap().pop_front().flatten())
    }

    async fn insert_pick(&self, input: NewPick) -> Result<PickInsert, Infallible> {
      self.inserts.fetch_add(1, Ordering::SeqCst);
      if self.always_conflict {
        return Ok(PickInsert::Conflict);
      }
      Ok(PickInsert::Inserted(pick_from(input)))
    }

    async fn replace_pick(
      &self,
      _pick_id: Uuid,
      _update: PickUpdate,
    ) -> Result<Option<DailyPick>, Infallible> {
      self.replaces.fetch_add(1, Ordering::SeqCst);
      Ok(None)
    }

    async fn delete_pick(&self, _owner_id: &str, _day: DayBucket) -> Result<bool, Infallible> {
      Ok(false)
    }

    async fn toggle_like(
      &self,
      _track_ref: &str,
      _user_id: &str,
    ) -> Result<Option<LikeToggle>, Infallible> {
      Ok(None)
    }

    async fn collage_rows(&self) -> Result<Vec<PickView>, Infallible> { Ok(Vec::new()) }
  }

  fn pick_from(input: NewPick) -> DailyPick {
    DailyPick {
      pick_id:            Uuid::new_v4(),
      track_ref:          input.track_ref,
      title:              input.track.title,
      artists:            input.track.artists,
      cover_url:          input.track.cover_url,
      submitted_at:       input.submitted_at,
      day:                DayBucket::of(input.submitted_at),
      owner_id:           input.owner_id,
      owner_display_name: input.owner_display_name,
      liked_by:           Default::default(),
    }
  }

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

  fn track(title: &str) -> TrackMetadata {
    TrackMetadata {
      title:     title.into(),
      artists:   vec!["Band".into()],
      cover_url: "cover".into(),
    }
  }

  fn resolver() -> StaticResolver {
    StaticResolver::new()
      .with_track("T1", track("Song A"))
      .with_track("T2", track("Song B"))
  }

  fn existing() -> DailyPick {
    pick_from(NewPick {
      owner_id:           "u1".into(),
      owner_display_name: "Al".into(),
      track_ref:          "T1".into(),
      track:              track("Song A"),
      submitted_at:       now(),
    })
  }

  #[tokio::test]
  async fn persistent_collisions_give_up_with_store_conflict() {
    let store = Scripted::new(Vec::new(), true);
    let resolver = resolver();
    let caller = Caller::new("u1", "Al");

    let err = SubmissionCoordinator::new(&store, &resolver)
      .submit_at(&caller, "T1", false, now())
      .await
      .unwrap_err();

    match err {
      Error::StoreConflict { owner_id, day } => {
        assert_eq!(owner_id, "u1");
        assert_eq!(day, DayBucket::of(now()));
      }
      other => panic!("expected StoreConflict, got {other:?}"),
    }
    assert_eq!(store.inserts.load(Ordering::SeqCst), MAX_INSERT_ATTEMPTS);
  }

  #[tokio::test]
  async fn replace_of_vanished_pick_falls_through_to_insert() {
    // First read sees a pick; it is gone by the time the replace runs.
    let store = Scripted::new(vec![Some(existing())], false);
    let resolver = resolver();
    let caller = Caller::new("u1", "Al");

    let submission = SubmissionCoordinator::new(&store, &resolver)
      .submit_at(&caller, "T2", true, now())
      .await
      .unwrap();

    assert_eq!(submission.result, SubmitOutcome::Created);
    assert_eq!(submission.pick.title, "Song B");
    assert_eq!(store.replaces.load(Ordering::SeqCst), 1);
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn collision_with_readable_winner_keeps_it() {
    // Empty read, colliding insert, then the winner is visible.
    let store = Scripted::new(vec![None, Some(existing())], true);
    let resolver = resolver();
    let caller = Caller::new("u1", "Al");

    let submission = SubmissionCoordinator::new(&store, &resolver)
      .submit_at(&caller, "T2", true, now())
      .await
      .unwrap();

    assert_eq!(submission.result, SubmitOutcome::KeptExisting);
    assert_eq!(submission.pick.track_ref, "T1");
    assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
  }
}
