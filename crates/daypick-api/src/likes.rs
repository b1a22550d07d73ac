//! Handler for `POST /like`.

use axum::{Json, extract::State};
use daypick_core::{
  like::LikeToggler,
  pick::LikeToggle,
  resolve::TrackResolver,
  store::{IdentityStore, PickStore},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeBody {
  #[serde(default)]
  pub track_ref: String,
  #[serde(default)]
  pub user_id:   String,
}

/// `POST /like`, body: `{"trackRef":"...","userId":"..."}`.
///
/// Each call flips the user's like; the response carries the new state and
/// count.
pub async fn toggle<S, R>(
  State(state): State<AppState<S, R>>,
  Json(body): Json<LikeBody>,
) -> Result<Json<LikeToggle>, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  let toggle = LikeToggler::new(&*state.store)
    .toggle(&body.track_ref, &body.user_id)
    .await?;
  Ok(Json(toggle))
}
