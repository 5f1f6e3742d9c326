//! HTTP Basic authentication of extractors.
//!
//! Credentials are checked against the argon2 hash stored on the extractor
//! record. On success the request carries an [`ExtractorIdentity`] for the
//! handlers in `comport-api`.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use comport_api::{ApiError, ExtractorIdentity};
use comport_core::store::ExtractorStore;
use rand_core::OsRng;

/// Username and password decoded from an `Authorization: Basic` header.
#[derive(Debug, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

/// Decode Basic credentials from `headers`.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Credentials, ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  Ok(Credentials {
    username: username.to_owned(),
    password: password.to_owned(),
  })
}

/// Check `password` against an argon2 PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> Result<(), ApiError> {
  let parsed_hash =
    PasswordHash::new(password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)
}

/// Produce an argon2 PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Middleware: authenticate the extractor or answer 401.
pub async fn require_extractor<S>(
  State(store): State<Arc<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: ExtractorStore + 'static,
{
  let creds = basic_credentials(req.headers())?;

  let extractor = store
    .find_extractor(&creds.username)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let Some(extractor) = extractor else {
    tracing::warn!(username = %creds.username, "unknown extractor");
    return Err(ApiError::Unauthorized);
  };

  if let Err(e) = verify_password(&creds.password, &extractor.password_hash) {
    tracing::warn!(username = %creds.username, "bad extractor password");
    return Err(e);
  }

  req
    .extensions_mut()
    .insert(ExtractorIdentity::new(extractor.username));
  Ok(next.run(req).await)
}
