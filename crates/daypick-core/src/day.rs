//! Day buckets: the canonical calendar-day key of a submission.
//!
//! Every day boundary in daypick is computed in UTC as the half-open window
//! `[00:00:00Z, next day 00:00:00Z)`. Submission, deletion, the "today"
//! lookup and collage grouping all go through [`DayBucket::of`], so the
//! uniqueness key and the feed grouping can never disagree.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A UTC calendar day. Renders and parses as `YYYY-MM-DD`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct DayBucket(NaiveDate);

impl DayBucket {
  pub fn new(date: NaiveDate) -> Self { Self(date) }

  /// The bucket a timestamp falls into.
  pub fn of(ts: DateTime<Utc>) -> Self { Self(ts.date_naive()) }

  /// The bucket for the current wall-clock time.
  pub fn today() -> Self { Self::of(Utc::now()) }

  pub fn date(&self) -> NaiveDate { self.0 }

  /// Inclusive start of the window.
  pub fn start(&self) -> DateTime<Utc> { self.0.and_time(NaiveTime::MIN).and_utc() }

  /// Exclusive end of the window.
  pub fn end(&self) -> DateTime<Utc> { self.start() + TimeDelta::days(1) }

  pub fn contains(&self, ts: DateTime<Utc>) -> bool {
    self.start() <= ts && ts < self.end()
  }
}

impl fmt::Display for DayBucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format("%Y-%m-%d"))
  }
}

impl FromStr for DayBucket {
  type Err = chrono::ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
  }

  #[test]
  fn window_is_half_open() {
    let day = DayBucket::of(at(2024, 1, 5, 13, 30, 0));
    assert_eq!(day.start(), at(2024, 1, 5, 0, 0, 0));
    assert_eq!(day.end(), at(2024, 1, 6, 0, 0, 0));
    assert!(day.contains(at(2024, 1, 5, 0, 0, 0)));
    assert!(day.contains(at(2024, 1, 5, 23, 59, 59)));
    assert!(!day.contains(at(2024, 1, 6, 0, 0, 0)));
  }

  #[test]
  fn last_second_of_day_stays_in_bucket() {
    let late = DayBucket::of(at(2024, 1, 5, 23, 59, 59));
    let next = DayBucket::of(at(2024, 1, 6, 0, 0, 0));
    assert_eq!(late.to_string(), "2024-01-05");
    assert_eq!(next.to_string(), "2024-01-06");
    assert!(late < next);
  }

  #[test]
  fn parses_and_serialises_as_date_string() {
    let day: DayBucket = "2024-01-02".parse().unwrap();
    assert_eq!(serde_json::to_string(&day).unwrap(), "\"2024-01-02\"");
    assert!("2024-13-01".parse::<DayBucket>().is_err());
  }
}
