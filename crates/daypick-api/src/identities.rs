//! Handler for `PUT /identities`, called by the login flow after the
//! identity provider has verified a user.

use axum::{Json, extract::State};
use daypick_core::{
  identity::{Identity, NewIdentity},
  resolve::TrackResolver,
  store::{IdentityStore, PickStore},
};

use crate::{AppState, error::ApiError};

/// `PUT /identities`: insert or refresh an identity. Tokens are stored but
/// never echoed back.
pub async fn upsert<S, R>(
  State(state): State<AppState<S, R>>,
  Json(body): Json<NewIdentity>,
) -> Result<Json<Identity>, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  body.validate()?;
  let identity = state
    .store
    .upsert_identity(body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  tracing::info!(external_id = %identity.external_id, "identity upserted");
  Ok(Json(identity))
}
