//! The storage traits the reconciliation engine and checkpoint tracker need.
//!
//! The traits are implemented by storage backends (e.g.
//! `comport-store-sqlite`). Nothing in this crate owns persisted state; every
//! call is given an explicit store handle.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  DepartmentId,
  extractor::{Checkpoint, Extractor, NewExtractor},
  schema::IncidentKind,
};

/// An incident record as persisted, with store-assigned identity and
/// timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct StoredIncident<R> {
  pub incident_id: Uuid,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  pub record:      R,
}

// ─── Incidents ───────────────────────────────────────────────────────────────

/// Lookup-by-natural-key and create/update primitives, per record type.
///
/// Each call is its own durable write; there is no batch-level transaction.
/// Implementations must reject a second create for an existing natural key so
/// that two concurrent batches cannot both insert the same incident.
pub trait IncidentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Find the stored incident whose department and key fields all equal the
  /// given ones. `None`-valued key fields match only `None`.
  fn find_incident<R: IncidentKind>(
    &self,
    department_id: DepartmentId,
    key: &R::Key,
  ) -> impl Future<Output = Result<Option<StoredIncident<R>>, Self::Error>> + Send;

  /// Persist a new incident.
  fn create_incident<R: IncidentKind>(
    &self,
    record: R,
  ) -> impl Future<Output = Result<StoredIncident<R>, Self::Error>> + Send;

  /// Overwrite the stored fields of an existing incident and bump
  /// `updated_at`.
  fn update_incident<R: IncidentKind>(
    &self,
    incident: &StoredIncident<R>,
  ) -> impl Future<Output = Result<StoredIncident<R>, Self::Error>> + Send;

  /// All incidents of one type for a department, in creation order.
  fn list_incidents<R: IncidentKind>(
    &self,
    department_id: DepartmentId,
  ) -> impl Future<Output = Result<Vec<StoredIncident<R>>, Self::Error>> + Send;
}

// ─── Extractors ──────────────────────────────────────────────────────────────

pub trait ExtractorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Register a new extractor. Usernames are unique.
  fn add_extractor(
    &self,
    input: NewExtractor,
  ) -> impl Future<Output = Result<Extractor, Self::Error>> + Send;

  /// Retrieve an extractor by username. Returns `None` if not found.
  fn find_extractor(
    &self,
    username: &str,
  ) -> impl Future<Output = Result<Option<Extractor>, Self::Error>> + Send;

  /// Set the extractor's last-contact time.
  fn touch_extractor(
    &self,
    extractor_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Replace the extractor's checkpoint; `None` clears it.
  fn set_checkpoint(
    &self,
    extractor_id: Uuid,
    checkpoint: Option<Checkpoint>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
