//! The reconciliation engine: match each incoming record against the store by
//! natural key, then create or update it.
//!
//! Records are processed strictly in batch order, one store round-trip at a
//! time, so a later record in a batch sees the effect of an earlier one with
//! the same key (last write wins). Every create/update is committed as it
//! happens. If record `n` fails coercion the call returns
//! [`Error::InvalidField`] and records `0..n` stay written.
//!
//! An incident created earlier in the same batch and then overwritten is
//! counted only as `added`. Every other applied update counts once per
//! matching record.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  DepartmentId, Error, Result,
  coerce::Payload,
  schema::{IncidentKind, UpdatePolicy},
  store::IncidentStore,
};

/// Per-batch counters returned to the extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
  pub added:   usize,
  pub updated: usize,
}

/// Outcome of [`apply_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
  /// The stored record was changed and must be persisted.
  Applied,
  /// The stored record was left as-is.
  Skipped,
}

/// Apply an incoming record to its matching stored record under `policy`.
pub fn apply_update<R: IncidentKind>(
  policy: UpdatePolicy,
  stored: &mut R,
  incoming: R,
) -> UpdateOutcome {
  match policy {
    UpdatePolicy::Overwrite => {
      stored.apply_fields(incoming);
      UpdateOutcome::Applied
    }
    UpdatePolicy::Ignore => UpdateOutcome::Skipped,
  }
}

/// Coerce one raw batch entry into a typed record.
pub fn coerce_record<R: IncidentKind>(
  department_id: DepartmentId,
  index: usize,
  raw: &Value,
) -> Result<R> {
  Payload::new(raw)
    .and_then(|payload| R::from_payload(department_id, &payload))
    .map_err(|source| Error::InvalidField { index, source })
}

/// Reconcile a batch using the record type's own update policy.
pub async fn reconcile<R, S>(
  store: &S,
  department_id: DepartmentId,
  batch: &[Value],
) -> Result<BatchSummary>
where
  R: IncidentKind,
  S: IncidentStore,
{
  reconcile_with_policy::<R, S>(store, department_id, batch, R::UPDATE_POLICY)
    .await
}

/// Reconcile a batch, overriding the record type's update policy.
pub async fn reconcile_with_policy<R, S>(
  store: &S,
  department_id: DepartmentId,
  batch: &[Value],
  policy: UpdatePolicy,
) -> Result<BatchSummary>
where
  R: IncidentKind,
  S: IncidentStore,
{
  let mut created: HashSet<Uuid> = HashSet::new();
  let mut updated = 0;

  for (index, raw) in batch.iter().enumerate() {
    let incoming = coerce_record::<R>(department_id, index, raw)?;
    let key = incoming.key();

    let existing = store
      .find_incident::<R>(department_id, &key)
      .await
      .map_err(Error::store)?;

    match existing {
      None => {
        let stored = store
          .create_incident(incoming)
          .await
          .map_err(Error::store)?;
        tracing::debug!(
          kind = %R::KIND,
          index,
          incident_id = %stored.incident_id,
          "created incident"
        );
        created.insert(stored.incident_id);
      }
      Some(mut stored) => {
        match apply_update(policy, &mut stored.record, incoming) {
          UpdateOutcome::Applied => {
            store.update_incident(&stored).await.map_err(Error::store)?;
            tracing::debug!(
              kind = %R::KIND,
              index,
              incident_id = %stored.incident_id,
              "updated incident"
            );
            if !created.contains(&stored.incident_id) {
              updated += 1;
            }
          }
          UpdateOutcome::Skipped => {
            tracing::debug!(
              kind = %R::KIND,
              index,
              incident_id = %stored.incident_id,
              "matched incident left unchanged"
            );
          }
        }
      }
    }
  }

  let summary = BatchSummary { added: created.len(), updated };

  tracing::info!(
    kind = %R::KIND,
    department_id,
    records = batch.len(),
    added = summary.added,
    updated = summary.updated,
    "reconciled batch"
  );

  Ok(summary)
}
