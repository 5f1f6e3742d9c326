//! Extractors: the per-department agents that submit incident batches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DepartmentId, Error, Result};

/// Where an extractor should resume a historical backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
  /// 1–12.
  pub month: u32,
  pub year:  i32,
}

impl Checkpoint {
  pub fn new(month: u32, year: i32) -> Result<Self> {
    if !(1..=12).contains(&month) || year <= 0 {
      return Err(Error::InvalidCheckpoint { month, year });
    }
    Ok(Self { month, year })
  }
}

/// A registered extractor. Created out-of-band; its contact time and
/// checkpoint are mutated by every inbound call.
#[derive(Debug, Clone, Serialize)]
pub struct Extractor {
  pub extractor_id:  Uuid,
  pub department_id: DepartmentId,
  pub username:      String,
  /// Argon2 PHC string checked by the transport layer.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
  pub last_contact:  Option<DateTime<Utc>>,
  /// `None` means no backfill is pending.
  pub checkpoint:    Option<Checkpoint>,
}

/// Input to [`crate::store::ExtractorStore::add_extractor`].
#[derive(Debug, Clone)]
pub struct NewExtractor {
  pub department_id: DepartmentId,
  pub username:      String,
  pub password_hash: String,
  pub checkpoint:    Option<Checkpoint>,
}

impl NewExtractor {
  /// Convenience constructor with no pending checkpoint.
  pub fn new(
    department_id: DepartmentId,
    username: impl Into<String>,
    password_hash: impl Into<String>,
  ) -> Self {
    Self {
      department_id,
      username: username.into(),
      password_hash: password_hash.into(),
      checkpoint: None,
    }
  }
}
