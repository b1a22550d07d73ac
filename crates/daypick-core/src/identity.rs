//! Identities and the caller value.
//!
//! An [`Identity`] is written by the login flow each time the identity
//! provider verifies a user. The core never deletes identities; it only reads
//! them to attach profile images to the collage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One record per external (identity-provider) user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  /// Stable id assigned by the identity provider; unique.
  pub external_id:       String,
  pub display_name:      Option<String>,
  pub email:             Option<String>,
  pub profile_image_url: Option<String>,
  #[serde(skip_serializing)]
  pub access_token:      String,
  #[serde(skip_serializing)]
  pub refresh_token:     String,
  /// Set on first login; preserved by later upserts.
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::IdentityStore::upsert_identity`]. Missing
/// fields deserialise as empty and are caught by [`NewIdentity::validate`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdentity {
  #[serde(default)]
  pub external_id:       String,
  pub display_name:      Option<String>,
  pub email:             Option<String>,
  pub profile_image_url: Option<String>,
  #[serde(default)]
  pub access_token:      String,
  #[serde(default)]
  pub refresh_token:     String,
}

impl NewIdentity {
  pub fn validate(&self) -> Result<()> {
    if self.external_id.trim().is_empty() {
      return Err(Error::InvalidInput("externalId must not be empty".into()));
    }
    if self.access_token.is_empty() || self.refresh_token.is_empty() {
      return Err(Error::InvalidInput("accessToken and refreshToken are required".into()));
    }
    Ok(())
  }
}

/// The verified identity a request acts as.
///
/// Produced by the session layer and passed explicitly into every core
/// operation; the core holds no ambient notion of "the current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub external_id:  String,
  pub display_name: String,
}

impl Caller {
  pub fn new(external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self {
      external_id:  external_id.into(),
      display_name: display_name.into(),
    }
  }

  /// Both fields must be non-blank.
  pub fn validate(&self) -> Result<()> {
    if self.external_id.trim().is_empty() {
      return Err(Error::InvalidInput("ownerId must not be empty".into()));
    }
    if self.display_name.trim().is_empty() {
      return Err(Error::InvalidInput("ownerDisplayName must not be empty".into()));
    }
    Ok(())
  }
}
