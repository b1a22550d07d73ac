//! Handlers for `/submit` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/submit` | Body: [`SubmitBody`]; 201 on create, 200 on keep/replace |
//! | `GET`    | `/submit/{owner_id}` | Today's pick; 404 if none |
//! | `DELETE` | `/submit/{owner_id}` | Deletes today's pick; 404 if none |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use daypick_core::{
  identity::Caller,
  pick::DailyPick,
  resolve::TrackResolver,
  store::{IdentityStore, PickStore},
  submit::{DeleteOutcome, SubmissionCoordinator, SubmitOutcome},
};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError};

// ─── Submit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submit`. Missing fields are reported as 400
/// by the coordinator's validation rather than rejected by the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
  #[serde(default)]
  pub track_ref:          String,
  #[serde(default)]
  pub owner_id:           String,
  #[serde(default)]
  pub owner_display_name: String,
  #[serde(default)]
  pub explicit_replace:   bool,
}

/// `POST /submit`
pub async fn submit<S, R>(
  State(state): State<AppState<S, R>>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  let caller = Caller::new(body.owner_id, body.owner_display_name);
  let submission = SubmissionCoordinator::new(&*state.store, &*state.resolver)
    .submit(&caller, &body.track_ref, body.explicit_replace)
    .await?;

  let status = match submission.result {
    SubmitOutcome::Created => StatusCode::CREATED,
    SubmitOutcome::KeptExisting | SubmitOutcome::Replaced => StatusCode::OK,
  };
  Ok((status, Json(submission)))
}

// ─── Today ────────────────────────────────────────────────────────────────────

/// `GET /submit/{owner_id}`
pub async fn today<S, R>(
  State(state): State<AppState<S, R>>,
  Path(owner_id): Path<String>,
) -> Result<Json<DailyPick>, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  let pick = SubmissionCoordinator::new(&*state.store, &*state.resolver)
    .today(&owner_id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no pick today for {owner_id}")))?;
  Ok(Json(pick))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /submit/{owner_id}`; the path owner is the caller.
pub async fn delete<S, R>(
  State(state): State<AppState<S, R>>,
  Path(owner_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  let caller = Caller::new(owner_id, String::new());
  let outcome = SubmissionCoordinator::new(&*state.store, &*state.resolver)
    .delete(&caller)
    .await?;

  let status = match outcome {
    DeleteOutcome::Deleted => StatusCode::OK,
    DeleteOutcome::NotFound => StatusCode::NOT_FOUND,
  };
  Ok((status, Json(json!({ "result": outcome }))))
}
