//! [`SqliteStore`], the SQLite implementation of [`IdentityStore`] and
//! [`PickStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use daypick_core::{
  day::DayBucket,
  identity::{Identity, NewIdentity},
  pick::{
    DailyPick, LikeState, LikeToggle, NewPick, PickInsert, PickUpdate, PickView,
  },
  store::{IdentityStore, PickStore, Store},
};

use crate::{
  Error, Result,
  encode::{
    RawIdentity, RawPick, RawPickView, encode_artists, encode_day, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

const PICK_COLUMNS: &str = "pick_id, owner_id, day, track_ref, title, artists, \
                            cover_url, owner_display_name, submitted_at";

const IDENTITY_COLUMNS: &str = "external_id, display_name, email, \
                                profile_image_url, access_token, refresh_token, \
                                created_at";

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Read one pick matching `filter` (a `WHERE` clause over `daily_picks`)
/// together with its likes.
fn load_pick<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  filter: &str,
  params: P,
) -> rusqlite::Result<Option<RawPick>> {
  let sql = format!("SELECT {PICK_COLUMNS} FROM daily_picks WHERE {filter}");
  let raw = conn
    .query_row(&sql, params, |row| {
      Ok(RawPick {
        pick_id:            row.get(0)?,
        owner_id:           row.get(1)?,
        day:                row.get(2)?,
        track_ref:          row.get(3)?,
        title:              row.get(4)?,
        artists:            row.get(5)?,
        cover_url:          row.get(6)?,
        owner_display_name: row.get(7)?,
        submitted_at:       row.get(8)?,
        liked_by:           Vec::new(),
      })
    })
    .optional()?;

  let Some(mut raw) = raw else { return Ok(None) };

  let mut stmt =
    conn.prepare("SELECT user_id FROM pick_likes WHERE pick_id = ?1")?;
  raw.liked_by = stmt
    .query_map(rusqlite::params![raw.pick_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(raw))
}

fn identity_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawIdentity> {
  Ok(RawIdentity {
    external_id:       row.get(0)?,
    display_name:      row.get(1)?,
    email:             row.get(2)?,
    profile_image_url: row.get(3)?,
    access_token:      row.get(4)?,
    refresh_token:     row.get(5)?,
    created_at:        row.get(6)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Identity and daily-pick stores backed by a single SQLite file.
///
/// The inner connection is reference-counted, so clones share it.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  async fn upsert_identity(&self, input: NewIdentity) -> Result<Identity> {
    let created_at = encode_dt(Utc::now());

    let raw: RawIdentity = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO identities ({IDENTITY_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (external_id) DO UPDATE SET
             display_name      = excluded.display_name,
             email             = excluded.email,
             profile_image_url = excluded.profile_image_url,
             access_token      = excluded.access_token,
             refresh_token     = excluded.refresh_token
           RETURNING {IDENTITY_COLUMNS}"
        );
        Ok(conn.query_row(
          &sql,
          rusqlite::params![
            input.external_id,
            input.display_name,
            input.email,
            input.profile_image_url,
            input.access_token,
            input.refresh_token,
            created_at,
          ],
          identity_row,
        )?)
      })
      .await?;

    raw.into_identity()
  }

  async fn get_identity(&self, external_id: &str) -> Result<Option<Identity>> {
    let id = external_id.to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE external_id = ?1");
        Ok(conn.query_row(&sql, rusqlite::params![id], identity_row).optional()?)
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }
}

// ─── PickStore impl ──────────────────────────────────────────────────────────

impl PickStore for SqliteStore {
  async fn find_pick(&self, owner_id: &str, day: DayBucket) -> Result<Option<DailyPick>> {
    let owner = owner_id.to_owned();
    let day_str = encode_day(day);

    let raw: Option<RawPick> = self
      .conn
      .call(move |conn| {
        Ok(load_pick(
          conn,
          "owner_id = ?1 AND day = ?2",
          rusqlite::params![owner, day_str],
        )?)
      })
      .await?;

    raw.map(RawPick::into_pick).transpose()
  }

  async fn insert_pick(&self, input: NewPick) -> Result<PickInsert> {
    let pick = DailyPick {
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
    };

    let pick_id_str      = encode_uuid(pick.pick_id);
    let owner_id         = pick.owner_id.clone();
    let day_str          = encode_day(pick.day);
    let track_ref        = pick.track_ref.clone();
    let title            = pick.title.clone();
    let artists_str      = encode_artists(&pick.artists)?;
    let cover_url        = pick.cover_url.clone();
    let display_name     = pick.owner_display_name.clone();
    let submitted_at_str = encode_dt(pick.submitted_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO daily_picks ({PICK_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (owner_id, day) DO NOTHING"
        );
        let changed = conn.execute(
          &sql,
          rusqlite::params![
            pick_id_str,
            owner_id,
            day_str,
            track_ref,
            title,
            artists_str,
            cover_url,
            display_name,
            submitted_at_str,
          ],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if inserted {
      Ok(PickInsert::Inserted(pick))
    } else {
      tracing::debug!(owner_id = %pick.owner_id, day = %pick.day, "insert hit (owner, day) key");
      Ok(PickInsert::Conflict)
    }
  }

  async fn replace_pick(
    &self,
    pick_id: Uuid,
    update: PickUpdate,
  ) -> Result<Option<DailyPick>> {
    let pick_id_str = encode_uuid(pick_id);
    let artists_str = encode_artists(&update.track.artists)?;

    let raw: Option<RawPick> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE daily_picks SET
             track_ref          = ?2,
             title              = ?3,
             artists            = ?4,
             cover_url          = ?5,
             owner_display_name = ?6
           WHERE pick_id = ?1",
          rusqlite::params![
            pick_id_str,
            update.track_ref,
            update.track.title,
            artists_str,
            update.track.cover_url,
            update.owner_display_name,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = load_pick(&tx, "pick_id = ?1", rusqlite::params![pick_id_str])?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawPick::into_pick).transpose()
  }

  async fn delete_pick(&self, owner_id: &str, day: DayBucket) -> Result<bool> {
    let owner = owner_id.to_owned();
    let day_str = encode_day(day);

    // Likes go with the pick via ON DELETE CASCADE.
    let deleted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM daily_picks WHERE owner_id = ?1 AND day = ?2",
          rusqlite::params![owner, day_str],
        )?;
        Ok(changed > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn toggle_like(&self, track_ref: &str, user_id: &str) -> Result<Option<LikeToggle>> {
    let track_ref = track_ref.to_owned();
    let user_id = user_id.to_owned();

    let toggled: Option<(LikeState, i64)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let pick_id: Option<String> = tx
          .query_row(
            "SELECT pick_id FROM daily_picks
             WHERE track_ref = ?1
             ORDER BY submitted_at, rowid
             LIMIT 1",
            rusqlite::params![track_ref],
            |row| row.get(0),
          )
          .optional()?;

        let Some(pick_id) = pick_id else { return Ok(None) };

        let removed = tx.execute(
          "DELETE FROM pick_likes WHERE pick_id = ?1 AND user_id = ?2",
          rusqlite::params![pick_id, user_id],
        )?;
        let state = if removed > 0 {
          LikeState::Unliked
        } else {
          tx.execute(
            "INSERT INTO pick_likes (pick_id, user_id) VALUES (?1, ?2)",
            rusqlite::params![pick_id, user_id],
          )?;
          LikeState::Liked
        };

        let count: i64 = tx.query_row(
          "SELECT COUNT(*) FROM pick_likes WHERE pick_id = ?1",
          rusqlite::params![pick_id],
          |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(Some((state, count)))
      })
      .await?;

    toggled
      .map(|(result, count)| {
        let count = usize::try_from(count)
          .map_err(|_| Error::Inconsistent(format!("like count {count}")))?;
        Ok(LikeToggle { result, count })
      })
      .transpose()
  }

  async fn collage_rows(&self) -> Result<Vec<PickView>> {
    let raws: Vec<RawPickView> = self
      .conn
      .call(|conn| {
        // Inner join: picks whose owner has no identity row are dropped.
        let mut stmt = conn.prepare(
          "SELECT
             p.pick_id, p.track_ref, p.title, p.artists, p.cover_url,
             p.owner_id, p.owner_display_name, p.submitted_at,
             i.profile_image_url,
             (SELECT COUNT(*) FROM pick_likes l WHERE l.pick_id = p.pick_id)
               AS like_count
           FROM daily_picks p
           INNER JOIN identities i ON i.external_id = p.owner_id
           ORDER BY p.submitted_at, p.rowid",
        )?;

        let rows = stmt
          .query_map([], |row| {
            Ok(RawPickView {
              pick_id:            row.get(0)?,
              track_ref:          row.get(1)?,
              title:              row.get(2)?,
              artists:            row.get(3)?,
              cover_url:          row.get(4)?,
              owner_id:           row.get(5)?,
              owner_display_name: row.get(6)?,
              submitted_at:       row.get(7)?,
              profile_image_url:  row.get(8)?,
              like_count:         row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPickView::into_view).collect()
  }
}
