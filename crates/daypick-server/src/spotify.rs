//! [`TrackResolver`] backed by the Spotify Web API.
//!
//! Uses the client-credentials flow; the app token is cached until shortly
//! before it expires. The cache lock is never held across a request.

use std::{
  sync::Mutex,
  time::{Duration, Instant},
};

use anyhow::Context as _;
use daypick_core::{
  pick::TrackMetadata,
  resolve::{ResolveError, TrackResolver},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::ServerConfig;

/// Refresh the token this long before Spotify says it expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  expires_in:   u64,
}

#[derive(Deserialize)]
struct TrackResponse {
  name:    String,
  artists: Vec<ArtistResponse>,
  album:   AlbumResponse,
}

#[derive(Deserialize)]
struct ArtistResponse {
  name: String,
}

#[derive(Deserialize)]
struct AlbumResponse {
  #[serde(default)]
  images: Vec<ImageResponse>,
}

#[derive(Deserialize)]
struct ImageResponse {
  url: String,
}

impl From<TrackResponse> for TrackMetadata {
  fn from(t: TrackResponse) -> Self {
    TrackMetadata {
      title:     t.name,
      artists:   t.artists.into_iter().map(|a| a.name).collect(),
      // Spotify lists album images largest first.
      cover_url: t
        .album
        .images
        .into_iter()
        .next()
        .map(|i| i.url)
        .unwrap_or_default(),
    }
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

struct CachedToken {
  value:      String,
  expires_at: Instant,
}

pub struct SpotifyResolver {
  client:        Client,
  client_id:     String,
  client_secret: String,
  api_base:      String,
  accounts_base: String,
  token:         Mutex<Option<CachedToken>>,
}

impl SpotifyResolver {
  pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      client_id: config.spotify_client_id.clone(),
      client_secret: config.spotify_client_secret.clone(),
      api_base: config.spotify_api_base.trim_end_matches('/').to_string(),
      accounts_base: config.spotify_accounts_base.trim_end_matches('/').to_string(),
      token: Mutex::new(None),
    })
  }

  fn cached_token(&self) -> Option<String> {
    let guard = self.token.lock().ok()?;
    guard
      .as_ref()
      .filter(|t| t.expires_at > Instant::now())
      .map(|t| t.value.clone())
  }

  async fn app_token(&self) -> Result<String, ResolveError> {
    if let Some(token) = self.cached_token() {
      return Ok(token);
    }

    let resp = self
      .client
      .post(format!("{}/api/token", self.accounts_base))
      .basic_auth(&self.client_id, Some(&self.client_secret))
      .form(&[("grant_type", "client_credentials")])
      .send()
      .await
      .map_err(|e| ResolveError::Upstream(format!("token request failed: {e}")))?;

    if !resp.status().is_success() {
      return Err(ResolveError::Upstream(format!(
        "token request returned {}",
        resp.status()
      )));
    }

    let token: TokenResponse = resp
      .json()
      .await
      .map_err(|e| ResolveError::Upstream(format!("decoding token: {e}")))?;

    let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
    if let Ok(mut guard) = self.token.lock() {
      *guard = Some(CachedToken {
        value:      token.access_token.clone(),
        expires_at: Instant::now() + lifetime,
      });
    }
    Ok(token.access_token)
  }

  fn clear_token(&self) {
    if let Ok(mut guard) = self.token.lock() {
      *guard = None;
    }
  }

  async fn fetch_track(&self, track_ref: &str) -> Result<reqwest::Response, ResolveError> {
    let token = self.app_token().await?;
    self
      .client
      .get(format!("{}/v1/tracks/{track_ref}", self.api_base))
      .bearer_auth(token)
      .send()
      .await
      .map_err(|e| ResolveError::Upstream(format!("track request failed: {e}")))
  }
}

/// Spotify track ids are 22 base-62 characters.
fn is_track_id(s: &str) -> bool {
  s.len() == 22 && s.chars().all(|c| c.is_ascii_alphanumeric())
}

impl TrackResolver for SpotifyResolver {
  async fn resolve(&self, track_ref: &str) -> Result<TrackMetadata, ResolveError> {
    if !is_track_id(track_ref) {
      return Err(ResolveError::NotFound(track_ref.to_owned()));
    }

    let mut resp = self.fetch_track(track_ref).await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      // The cached token was revoked before its expiry.
      tracing::debug!(%track_ref, "spotify rejected app token, refreshing");
      self.clear_token();
      resp = self.fetch_track(track_ref).await?;
    }

    match resp.status() {
      s if s.is_success() => {}
      StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => {
        return Err(ResolveError::NotFound(track_ref.to_owned()));
      }
      s => {
        if s == StatusCode::UNAUTHORIZED {
          self.clear_token();
        }
        tracing::warn!(%track_ref, status = %s, "spotify track lookup failed");
        return Err(ResolveError::Upstream(format!("track request returned {s}")));
      }
    }

    let track: TrackResponse = resp
      .json()
      .await
      .map_err(|e| ResolveError::Upstream(format!("decoding track: {e}")))?;
    Ok(track.into())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn track_response_maps_to_metadata() {
    let raw = serde_json::json!({
      "name": "Song A",
      "artists": [{ "name": "Band" }, { "name": "Guest" }],
      "album": { "images": [{ "url": "large" }, { "url": "small" }] },
      "popularity": 50,
    });
    let track: TrackResponse = serde_json::from_value(raw).unwrap();
    let meta = TrackMetadata::from(track);
    assert_eq!(meta.title, "Song A");
    assert_eq!(meta.artists, ["Band", "Guest"]);
    assert_eq!(meta.cover_url, "large");
  }

  #[test]
  fn album_without_images_has_empty_cover() {
    let raw = serde_json::json!({
      "name": "Song A",
      "artists": [{ "name": "Band" }],
      "album": {},
    });
    let track: TrackResponse = serde_json::from_value(raw).unwrap();
    assert!(TrackMetadata::from(track).cover_url.is_empty());
  }

  #[test]
  fn only_base62_ids_are_looked_up() {
    assert!(is_track_id("4uLU6hMCjMI75M1A2tKUQC"));
    assert!(!is_track_id("T1"));
    assert!(!is_track_id("4uLU6hMCjMI75M1A2tKU/C"));
  }

  // ── Against a local stand-in for the Spotify API ───────────────────────────

  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode as HttpStatus, header},
    routing::{get, post},
  };
  use serde_json::{Value, json};

  const TRACK_ID: &str = "4uLU6hMCjMI75M1A2tKUQC";

  /// Serves a token endpoint that always issues `fresh`, and a track endpoint
  /// that only accepts `fresh`. Returns the base URL and the number of token
  /// requests served.
  async fn fake_spotify() -> (String, Arc<AtomicUsize>) {
    let issued = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&issued);
    let app = Router::new()
      .route(
        "/api/token",
        post(move || {
          let counter = Arc::clone(&counter);
          async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Json(json!({ "access_token": "fresh", "expires_in": 3600 }))
          }
        }),
      )
      .route(
        "/v1/tracks/{id}",
        get(|headers: HeaderMap| async move {
          let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
          if auth != "Bearer fresh" {
            return (HttpStatus::UNAUTHORIZED, Json(Value::Null));
          }
          (
            HttpStatus::OK,
            Json(json!({
              "name": "Song A",
              "artists": [{ "name": "Band" }],
              "album": { "images": [{ "url": "cover" }] },
            })),
          )
        }),
      );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (base, issued)
  }

  fn resolver_for(base: &str) -> SpotifyResolver {
    SpotifyResolver::new(&ServerConfig {
      host:                  "127.0.0.1".into(),
      port:                  0,
      store_path:            "unused".into(),
      spotify_client_id:     "id".into(),
      spotify_client_secret: "secret".into(),
      spotify_api_base:      base.into(),
      spotify_accounts_base: base.into(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn revoked_cached_token_is_refreshed_once() {
    let (base, issued) = fake_spotify().await;
    let resolver = resolver_for(&base);
    *resolver.token.lock().unwrap() = Some(CachedToken {
      value:      "revoked".into(),
      expires_at: Instant::now() + Duration::from_secs(3600),
    });

    let meta = resolver.resolve(TRACK_ID).await.unwrap();
    assert_eq!(meta.title, "Song A");
    assert_eq!(issued.load(Ordering::SeqCst), 1);
    assert_eq!(resolver.cached_token().as_deref(), Some("fresh"));

    // The refreshed token is reused.
    resolver.resolve(TRACK_ID).await.unwrap();
    assert_eq!(issued.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn malformed_id_never_reaches_the_api() {
    let (base, issued) = fake_spotify().await;
    let resolver = resolver_for(&base);
    assert!(matches!(
      resolver.resolve("not-an-id").await,
      Err(ResolveError::NotFound(_))
    ));
    assert_eq!(issued.load(Ordering::SeqCst), 0);
  }
}
