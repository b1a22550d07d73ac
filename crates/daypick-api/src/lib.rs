//! JSON REST API for daypick.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`IdentityStore`] and [`PickStore`], and any [`TrackResolver`]. Session
//! handling, TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", daypick_api::api_router(store.clone(), resolver.clone()))
//! ```

pub mod collage;
pub mod error;
pub mod identities;
pub mod likes;
pub mod submissions;
pub mod tracks;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use daypick_core::{
  resolve::TrackResolver,
  store::{IdentityStore, PickStore},
};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, R> {
  pub store:    Arc<S>,
  pub resolver: Arc<R>,
}

impl<S, R> Clone for AppState<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      resolver: Arc::clone(&self.resolver),
    }
  }
}

/// Build a fully-materialised API router for `store` and `resolver`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, R>(store: Arc<S>, resolver: Arc<R>) -> Router<()>
where
  S: IdentityStore + PickStore + 'static,
  R: TrackResolver + 'static,
{
  Router::new()
    // Daily submissions
    .route("/submit", post(submissions::submit::<S, R>))
    .route(
      "/submit/{owner_id}",
      get(submissions::today::<S, R>).delete(submissions::delete::<S, R>),
    )
    // Feed
    .route("/collage", get(collage::handler::<S, R>))
    .route("/like", post(likes::toggle::<S, R>))
    .route("/tracks", get(tracks::preview::<S, R>))
    // Login collaborator
    .route("/identities", put(identities::upsert::<S, R>))
    .with_state(AppState { store, resolver })
}
