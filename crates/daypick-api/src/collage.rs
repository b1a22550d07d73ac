//! Handler for `GET /collage`.

use axum::{Json, extract::State};
use daypick_core::{
  collage::CollageAggregator,
  pick::DayGroup,
  resolve::TrackResolver,
  store::{IdentityStore, PickStore},
};

use crate::{AppState, error::ApiError};

/// `GET /collage`: every day's picks, newest day first.
pub async fn handler<S, R>(
  State(state): State<AppState<S, R>>,
) -> Result<Json<Vec<DayGroup>>, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  let groups = CollageAggregator::new(&*state.store).collage().await?;
  Ok(Json(groups))
}
