//! The collage: every pick, grouped by UTC day, newest day first.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
  Error, Result,
  day::DayBucket,
  pick::{DayGroup, PickView},
  store::PickStore,
};

pub struct CollageAggregator<'a, S> {
  store: &'a S,
}

impl<'a, S: PickStore> CollageAggregator<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Picks whose owner is missing from the identity store are left out by
  /// the store's inner join.
  pub async fn collage(&self) -> Result<Vec<DayGroup>> {
    let rows = self.store.collage_rows().await.map_err(Error::store)?;
    let groups = group_by_day(rows);
    debug!(days = groups.len(), "collage built");
    Ok(groups)
  }
}

/// Group rows by the day of `submitted_at`. Groups are sorted descending by
/// day; rows keep their input order within a group.
pub fn group_by_day(rows: Vec<PickView>) -> Vec<DayGroup> {
  let mut days: BTreeMap<DayBucket, Vec<PickView>> = BTreeMap::new();
  for row in rows {
    days.entry(DayBucket::of(row.submitted_at)).or_default().push(row);
  }
  days
    .into_iter()
    .rev()
    .map(|(day, picks)| DayGroup { day, picks })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;

  fn view(owner: &str, title: &str, y: i32, m: u32, d: u32, h: u32) -> PickView {
    PickView {
      pick_id:            Uuid::new_v4(),
      track_ref:          format!("ref-{title}"),
      title:              title.into(),
      artists:            vec!["Band".into()],
      cover_url:          "cover".into(),
      owner_id:           owner.into(),
      owner_display_name: owner.to_uppercase(),
      submitted_at:       Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
      profile_image_url:  None,
      like_count:         0,
    }
  }

  #[test]
  fn groups_sorted_newest_first() {
    let groups = group_by_day(vec![
      view("u1", "a", 2024, 1, 2, 9),
      view("u2", "b", 2024, 1, 5, 9),
    ]);
    let days: Vec<String> = groups.iter().map(|g| g.day.to_string()).collect();
    assert_eq!(days, ["2024-01-05", "2024-01-02"]);
  }

  #[test]
  fn same_day_rows_share_a_group_in_input_order() {
    let groups = group_by_day(vec![
      view("u1", "first", 2024, 3, 1, 22),
      view("u2", "other-day", 2024, 2, 28, 10),
      view("u3", "second", 2024, 3, 1, 1),
      view("u4", "third", 2024, 3, 1, 12),
    ]);
    assert_eq!(groups.len(), 2);
    let titles: Vec<&str> = groups[0].picks.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["first", "second", "third"]);
    assert_eq!(groups[1].picks[0].title, "other-day");
  }

  #[test]
  fn midnight_starts_a_new_group() {
    let groups = group_by_day(vec![
      view("u1", "late", 2024, 1, 1, 23),
      view("u2", "early", 2024, 1, 2, 0),
    ]);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].picks[0].title, "early");
  }

  #[test]
  fn empty_input_gives_empty_collage() {
    assert!(group_by_day(Vec::new()).is_empty());
  }
}
