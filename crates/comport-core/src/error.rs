//! Error types for `comport-core`.

use thiserror::Error;

use crate::coerce::FieldError;

#[derive(Debug, Error)]
pub enum Error {
  /// A record in a submitted batch is missing a required field or carries a
  /// value that cannot be coerced. Records before `index` have already been
  /// written.
  #[error("record {index}: {source}")]
  InvalidField {
    index:  usize,
    #[source]
    source: FieldError,
  },

  #[error("extractor not found: {0}")]
  ExtractorNotFound(String),

  #[error("invalid checkpoint {month}/{year}")]
  InvalidCheckpoint { month: u32, year: i32 },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Box a storage-backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
