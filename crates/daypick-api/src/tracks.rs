//! Handler for `GET /tracks`, the pre-submit preview.

use axum::{
  Json,
  extract::{Query, State},
};
use daypick_core::{
  resolve::{TrackPreview, TrackResolver, preview_track},
  store::{IdentityStore, PickStore},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackQuery {
  #[serde(default)]
  pub track_ref: String,
}

/// `GET /tracks?trackRef=<link, URI or id>`
pub async fn preview<S, R>(
  State(state): State<AppState<S, R>>,
  Query(query): Query<TrackQuery>,
) -> Result<Json<TrackPreview>, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  let preview = preview_track(&*state.resolver, &query.track_ref).await?;
  Ok(Json(preview))
}
