//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order equals chronological order. Artists are a
//! compact JSON array. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use daypick_core::{
  day::DayBucket,
  identity::Identity,
  pick::{DailyPick, PickView},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── DayBucket ────────────────────────────────────────────────────────────────

pub fn encode_day(day: DayBucket) -> String { day.to_string() }

pub fn decode_day(s: &str) -> Result<DayBucket> {
  s.parse()
    .map_err(|e: chrono::ParseError| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Artists ─────────────────────────────────────────────────────────────────

pub fn encode_artists(artists: &[String]) -> Result<String> {
  Ok(serde_json::to_string(artists)?)
}

pub fn decode_artists(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read from a `daily_picks` row plus its `pick_likes` user ids.
pub struct RawPick {
  pub pick_id:            String,
  pub owner_id:           String,
  pub day:                String,
  pub track_ref:          String,
  pub title:              String,
  pub artists:            String,
  pub cover_url:          String,
  pub owner_display_name: String,
  pub submitted_at:       String,
  pub liked_by:           Vec<String>,
}

impl RawPick {
  pub fn into_pick(self) -> Result<DailyPick> {
    Ok(DailyPick {
      pick_id:            decode_uuid(&self.pick_id)?,
      track_ref:          self.track_ref,
      title:              self.title,
      artists:            decode_artists(&self.artists)?,
      cover_url:          self.cover_url,
      submitted_at:       decode_dt(&self.submitted_at)?,
      day:                decode_day(&self.day)?,
      owner_id:           self.owner_id,
      owner_display_name: self.owner_display_name,
      liked_by:           self.liked_by.into_iter().collect(),
    })
  }
}

/// Raw strings read from the collage join.
pub struct RawPickView {
  pub pick_id:            String,
  pub track_ref:          String,
  pub title:              String,
  pub artists:            String,
  pub cover_url:          String,
  pub owner_id:           String,
  pub owner_display_name: String,
  pub submitted_at:       String,
  pub profile_image_url:  Option<String>,
  pub like_count:         i64,
}

impl RawPickView {
  pub fn into_view(self) -> Result<PickView> {
    let like_count = usize::try_from(self.like_count)
      .map_err(|_| Error::Inconsistent(format!("like count {}", self.like_count)))?;
    Ok(PickView {
      pick_id: decode_uuid(&self.pick_id)?,
      track_ref: self.track_ref,
      title: self.title,
      artists: decode_artists(&self.artists)?,
      cover_url: self.cover_url,
      owner_id: self.owner_id,
      owner_display_name: self.owner_display_name,
      submitted_at: decode_dt(&self.submitted_at)?,
      profile_image_url: self.profile_image_url,
      like_count,
    })
  }
}

/// Raw strings read from an `identities` row.
pub struct RawIdentity {
  pub external_id:       String,
  pub display_name:      Option<String>,
  pub email:             Option<String>,
  pub profile_image_url: Option<String>,
  pub access_token:      String,
  pub refresh_token:     String,
  pub created_at:        String,
}

impl RawIdentity {
  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      external_id:       self.external_id,
      display_name:      self.display_name,
      email:             self.email,
      profile_image_url: self.profile_image_url,
      access_token:      self.access_token,
      refresh_token:     self.refresh_token,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::TimeDelta::milliseconds(500);
    let c = a + chrono::TimeDelta::seconds(1);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec, "{ea} {eb} {ec}");
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }
}
