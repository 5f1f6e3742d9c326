//! Error type for `comport-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] comport_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A create lost a race with another create for the same natural key.
  #[error("{kind} incident already exists for department {department_id}: {natural_key}")]
  DuplicateKey {
    kind:          &'static str,
    department_id: i64,
    natural_key:   String,
  },

  #[error("incident not found: {0}")]
  IncidentNotFound(uuid::Uuid),

  #[error("extractor not found: {0}")]
  ExtractorNotFound(uuid::Uuid),

  #[error("username already taken: {0}")]
  UsernameTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
