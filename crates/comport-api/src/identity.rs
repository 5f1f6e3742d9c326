//! The authenticated caller, as seen by the handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Username of the extractor making the request.
///
/// Inserted into the request extensions by whatever layer checked the
/// credentials. A request without one is rejected as unauthorized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorIdentity {
  pub username: String,
}

impl ExtractorIdentity {
  pub fn new(username: impl Into<String>) -> Self {
    Self { username: username.into() }
  }
}

impl<S: Send + Sync> FromRequestParts<S> for ExtractorIdentity {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<ExtractorIdentity>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}
