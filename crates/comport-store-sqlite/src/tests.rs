//! Integration tests for `SqliteStore` against an in-memory database, plus the
//! end-to-end ingest behaviour it backs.

use comport_core::{
  DepartmentId, Error as CoreError,
  extractor::{Checkpoint, Extractor, NewExtractor},
  incident::{CitizenComplaint, OfficerInvolvedShooting, UseOfForceIncident},
  ingest,
  reconcile::{self, BatchSummary},
  schema::{FieldKind, IncidentKind, UpdatePolicy},
  store::{ExtractorStore, IncidentStore},
};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn extractor(
  s: &SqliteStore,
  department_id: DepartmentId,
  username: &str,
) -> Extractor {
  s.add_extractor(NewExtractor::new(department_id, username, "unused-hash"))
    .await
    .unwrap()
}

/// A complete payload for `R`: every declared field null except the date,
/// then `overrides` laid on top.
fn payload<R: IncidentKind>(overrides: Value) -> Value {
  let mut fields = Map::new();
  for spec in R::FIELDS {
    if let Some(source) = spec.source {
      let default = match spec.kind {
        FieldKind::Date => json!("2021-03-04"),
        _ => Value::Null,
      };
      fields.insert(source.to_owned(), default);
    }
  }
  if let Value::Object(overrides) = overrides {
    fields.extend(overrides);
  }
  Value::Object(fields)
}

fn uof(opaque_id: &str, officer: &str, force_type: &str, disposition: &str) -> Value {
  payload::<UseOfForceIncident>(json!({
    "opaqueId": opaque_id,
    "officerIdentifier": officer,
    "officerForceType": force_type,
    "disposition": disposition,
  }))
}

fn ois(opaque_id: &str, disposition: &str) -> Value {
  payload::<OfficerInvolvedShooting>(json!({
    "opaqueId": opaque_id,
    "disposition": disposition,
  }))
}

fn complaint(opaque_id: &str, allegation: &str, disposition: &str) -> Value {
  payload::<CitizenComplaint>(json!({
    "opaqueId": opaque_id,
    "allegationType": "Conduct",
    "allegation": allegation,
    "officerIdentifier": "badge-1",
    "disposition": disposition,
  }))
}

fn ois_record(department_id: DepartmentId, opaque_id: &str) -> OfficerInvolvedShooting {
  reconcile::coerce_record(department_id, 0, &ois(opaque_id, "Pending")).unwrap()
}

// ─── Extractors ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_find_extractor() {
  let s = store().await;
  let added = extractor(&s, 7, "ext-a").await;

  let found = s.find_extractor("ext-a").await.unwrap().unwrap();
  assert_eq!(found.extractor_id, added.extractor_id);
  assert_eq!(found.department_id, 7);
  assert_eq!(found.password_hash, "unused-hash");
  assert!(found.last_contact.is_none());
  assert!(found.checkpoint.is_none());
}

#[tokio::test]
async fn find_extractor_missing_returns_none() {
  let s = store().await;
  assert!(s.find_extractor("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  extractor(&s, 1, "ext-a").await;
  let err = s
    .add_extractor(NewExtractor::new(2, "ext-a", "other"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UsernameTaken(name) if name == "ext-a"));
}

#[tokio::test]
async fn add_extractor_with_checkpoint() {
  let s = store().await;
  let input = NewExtractor {
    checkpoint: Some(Checkpoint::new(3, 2021).unwrap()),
    ..NewExtractor::new(1, "ext-a", "hash")
  };
  s.add_extractor(input).await.unwrap();

  let found = s.find_extractor("ext-a").await.unwrap().unwrap();
  assert_eq!(found.checkpoint, Some(Checkpoint { month: 3, year: 2021 }));
}

#[tokio::test]
async fn touch_extractor_sets_last_contact() {
  let s = store().await;
  let ext = extractor(&s, 1, "ext-a").await;
  let at = chrono::Utc::now();

  s.touch_extractor(ext.extractor_id, at).await.unwrap();

  let found = s.find_extractor("ext-a").await.unwrap().unwrap();
  let stored = found.last_contact.unwrap();
  assert_eq!(stored.timestamp_micros(), at.timestamp_micros());
}

#[tokio::test]
async fn touch_unknown_extractor_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s.touch_extractor(id, chrono::Utc::now()).await.unwrap_err();
  assert!(matches!(err, Error::ExtractorNotFound(missing) if missing == id));
}

#[tokio::test]
async fn set_and_clear_checkpoint() {
  let s = store().await;
  let ext = extractor(&s, 1, "ext-a").await;

  let cp = Checkpoint::new(11, 2019).unwrap();
  s.set_checkpoint(ext.extractor_id, Some(cp)).await.unwrap();
  let found = s.find_extractor("ext-a").await.unwrap().unwrap();
  assert_eq!(found.checkpoint, Some(cp));

  s.set_checkpoint(ext.extractor_id, None).await.unwrap();
  let found = s.find_extractor("ext-a").await.unwrap().unwrap();
  assert!(found.checkpoint.is_none());
}

// ─── Incidents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_incident() {
  let s = store().await;
  let record = ois_record(1, "ois-1");
  let key = record.key();

  let created = s.create_incident(record.clone()).await.unwrap();
  assert_eq!(created.record, record);

  let found = s
    .find_incident::<OfficerInvolvedShooting>(1, &key)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.incident_id, created.incident_id);
  assert_eq!(found.record, record);
}

#[tokio::test]
async fn find_incident_is_scoped_to_department() {
  let s = store().await;
  let record = ois_record(1, "ois-1");
  let key = record.key();
  s.create_incident(record).await.unwrap();

  let other = s
    .find_incident::<OfficerInvolvedShooting>(2, &key)
    .await
    .unwrap();
  assert!(other.is_none());
}

#[tokio::test]
async fn duplicate_natural_key_is_rejected() {
  let s = store().await;
  s.create_incident(ois_record(1, "ois-1")).await.unwrap();

  let err = s.create_incident(ois_record(1, "ois-1")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::DuplicateKey { kind: "officer_involved_shooting", department_id: 1, .. }
  ));
}

#[tokio::test]
async fn update_incident_persists_record() {
  let s = store().await;
  let mut stored = s.create_incident(ois_record(1, "ois-1")).await.unwrap();
  stored.record.disposition = Some("Closed".into());

  let updated = s.update_incident(&stored).await.unwrap();
  assert!(updated.updated_at >= stored.created_at);

  let found = s
    .find_incident::<OfficerInvolvedShooting>(1, &stored.record.key())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.record.disposition.as_deref(), Some("Closed"));
  assert_eq!(found.created_at, stored.created_at);
}

#[tokio::test]
async fn update_missing_incident_errors() {
  let s = store().await;
  let stored = s.create_incident(ois_record(1, "ois-1")).await.unwrap();
  let ghost = comport_core::store::StoredIncident {
    incident_id: Uuid::new_v4(),
    ..stored
  };
  let err = s.update_incident(&ghost).await.unwrap_err();
  assert!(matches!(err, Error::IncidentNotFound(id) if id == ghost.incident_id));
}

#[tokio::test]
async fn list_incidents_in_insertion_order() {
  let s = store().await;
  for id in ["b", "a", "c"] {
    s.create_incident(ois_record(1, id)).await.unwrap();
  }
  s.create_incident(ois_record(2, "z")).await.unwrap();

  let listed = s.list_incidents::<OfficerInvolvedShooting>(1).await.unwrap();
  let ids: Vec<_> = listed.iter().map(|i| i.record.opaque_id.as_str()).collect();
  assert_eq!(ids, ["b", "a", "c"]);

  let uof = s.list_incidents::<UseOfForceIncident>(1).await.unwrap();
  assert!(uof.is_empty());
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn uof_resubmission_updates_every_record() {
  let s = store().await;
  extractor(&s, 1, "ext").await;
  let batch = vec![
    uof("u-1", "badge-1", "Taser", "Pending"),
    uof("u-2", "badge-2", "Baton", "Pending"),
    uof("u-3", "badge-3", "Hands", "Pending"),
  ];

  let first = ingest::submit_batch::<UseOfForceIncident, _>(&s, "ext", &batch)
    .await
    .unwrap();
  assert_eq!(first, BatchSummary { added: 3, updated: 0 });

  let second = ingest::submit_batch::<UseOfForceIncident, _>(&s, "ext", &batch)
    .await
    .unwrap();
  assert_eq!(second, BatchSummary { added: 0, updated: 3 });

  let stored = s.list_incidents::<UseOfForceIncident>(1).await.unwrap();
  assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn ois_resubmission_updates_every_record() {
  let s = store().await;
  extractor(&s, 1, "ext").await;
  let batch = vec![ois("o-1", "Pending"), ois("o-2", "Pending")];

  let first = ingest::submit_batch::<OfficerInvolvedShooting, _>(&s, "ext", &batch)
    .await
    .unwrap();
  assert_eq!(first, BatchSummary { added: 2, updated: 0 });

  let second = ingest::submit_batch::<OfficerInvolvedShooting, _>(&s, "ext", &batch)
    .await
    .unwrap();
  assert_eq!(second, BatchSummary { added: 0, updated: 2 });
}

#[tokio::test]
async fn complaint_resubmission_changes_nothing() {
  let s = store().await;
  extractor(&s, 1, "ext").await;
  let batch = vec![
    complaint("c-1", "Rudeness", "Pending"),
    complaint("c-1", "Excessive force", "Pending"),
  ];

  let first = ingest::submit_batch::<CitizenComplaint, _>(&s, "ext", &batch)
    .await
    .unwrap();
  assert_eq!(first, BatchSummary { added: 2, updated: 0 });

  let changed = vec![
    complaint("c-1", "Rudeness", "Sustained"),
    complaint("c-1", "Excessive force", "Sustained"),
  ];
  let second = ingest::submit_batch::<CitizenComplaint, _>(&s, "ext", &changed)
    .await
    .unwrap();
  assert_eq!(second, BatchSummary { added: 0, updated: 0 });

  let stored = s.list_incidents::<CitizenComplaint>(1).await.unwrap();
  assert_eq!(stored.len(), 2);
  assert!(
    stored
      .iter()
      .all(|i| i.record.disposition.as_deref() == Some("Pending"))
  );
}

#[tokio::test]
async fn complaint_policy_can_be_overridden() {
  let s = store().await;
  let batch = vec![complaint("c-1", "Rudeness", "Pending")];
  reconcile::reconcile::<CitizenComplaint, _>(&s, 1, &batch)
    .await
    .unwrap();

  let changed = vec![complaint("c-1", "Rudeness", "Sustained")];
  let summary = reconcile::reconcile_with_policy::<CitizenComplaint, _>(
    &s,
    1,
    &changed,
    UpdatePolicy::Overwrite,
  )
  .await
  .unwrap();
  assert_eq!(summary, BatchSummary { added: 0, updated: 1 });

  let stored = s.list_incidents::<CitizenComplaint>(1).await.unwrap();
  assert_eq!(stored[0].record.disposition.as_deref(), Some("Sustained"));
}

#[tokio::test]
async fn uof_key_discriminates_officers() {
  let s = store().await;
  let batch = vec![
    uof("shared", "badge-1", "Taser", "Pending"),
    uof("shared", "badge-2", "Taser", "Pending"),
  ];

  let summary = reconcile::reconcile::<UseOfForceIncident, _>(&s, 1, &batch)
    .await
    .unwrap();
  assert_eq!(summary, BatchSummary { added: 2, updated: 0 });
  assert_eq!(s.list_incidents::<UseOfForceIncident>(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn uof_null_key_fields_match_each_other() {
  let s = store().await;
  let bare = payload::<UseOfForceIncident>(json!({ "opaqueId": "u-1" }));

  let first = reconcile::reconcile::<UseOfForceIncident, _>(&s, 1, &[bare.clone()])
    .await
    .unwrap();
  assert_eq!(first, BatchSummary { added: 1, updated: 0 });

  let second = reconcile::reconcile::<UseOfForceIncident, _>(&s, 1, &[bare])
    .await
    .unwrap();
  assert_eq!(second, BatchSummary { added: 0, updated: 1 });
}

#[tokio::test]
async fn ois_last_write_wins_within_batch() {
  let s = store().await;
  let batch = vec![ois("o-1", "Pending"), ois("o-1", "Closed")];

  let summary = reconcile::reconcile::<OfficerInvolvedShooting, _>(&s, 1, &batch)
    .await
    .unwrap();
  assert_eq!(summary, BatchSummary { added: 1, updated: 0 });

  let stored = s.list_incidents::<OfficerInvolvedShooting>(1).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].record.disposition.as_deref(), Some("Closed"));
}

#[tokio::test]
async fn repeated_match_counts_every_update() {
  let s = store().await;
  reconcile::reconcile::<OfficerInvolvedShooting, _>(&s, 1, &[ois("o-1", "A")])
    .await
    .unwrap();

  let batch = vec![ois("o-1", "B"), ois("o-1", "C")];
  let summary = reconcile::reconcile::<OfficerInvolvedShooting, _>(&s, 1, &batch)
    .await
    .unwrap();
  assert_eq!(summary, BatchSummary { added: 0, updated: 2 });

  let stored = s.list_incidents::<OfficerInvolvedShooting>(1).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].record.disposition.as_deref(), Some("C"));
}

#[tokio::test]
async fn departments_do_not_share_incidents() {
  let s = store().await;
  extractor(&s, 1, "ext-1").await;
  extractor(&s, 2, "ext-2").await;
  let batch = vec![ois("o-1", "Pending")];

  for username in ["ext-1", "ext-2"] {
    let summary =
      ingest::submit_batch::<OfficerInvolvedShooting, _>(&s, username, &batch)
        .await
        .unwrap();
    assert_eq!(summary, BatchSummary { added: 1, updated: 0 });
  }

  let dept2 = s.list_incidents::<OfficerInvolvedShooting>(2).await.unwrap();
  assert_eq!(dept2.len(), 1);
  assert_eq!(dept2[0].record.department_id, 2);
}

#[tokio::test]
async fn empty_batch_counts_nothing() {
  let s = store().await;
  extractor(&s, 1, "ext").await;
  let summary = ingest::submit_batch::<UseOfForceIncident, _>(&s, "ext", &[])
    .await
    .unwrap();
  assert_eq!(summary, BatchSummary::default());
}

// ─── Failure handling ────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_record_keeps_earlier_writes() {
  let s = store().await;
  let ext = extractor(&s, 1, "ext").await;
  s.set_checkpoint(ext.extractor_id, Some(Checkpoint::new(3, 2021).unwrap()))
    .await
    .unwrap();

  let mut broken = ois("o-2", "Pending");
  broken.as_object_mut().unwrap().remove("occuredDate");
  let batch = vec![ois("o-1", "Pending"), broken, ois("o-3", "Pending")];

  let err = ingest::submit_batch::<OfficerInvolvedShooting, _>(&s, "ext", &batch)
    .await
    .unwrap_err();
  match err {
    CoreError::InvalidField { index, source } => {
      assert_eq!(index, 1);
      assert_eq!(source.field, "occuredDate");
    }
    other => panic!("unexpected error: {other:?}"),
  }

  let stored = s.list_incidents::<OfficerInvolvedShooting>(1).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].record.opaque_id, "o-1");

  let after = s.find_extractor("ext").await.unwrap().unwrap();
  assert!(after.last_contact.is_some());
  assert_eq!(after.checkpoint, Some(Checkpoint { month: 3, year: 2021 }));
}

#[tokio::test]
async fn unknown_extractor_writes_nothing() {
  let s = store().await;
  let err = ingest::submit_batch::<OfficerInvolvedShooting, _>(
    &s,
    "ghost",
    &[ois("o-1", "Pending")],
  )
  .await
  .unwrap_err();
  assert!(matches!(err, CoreError::ExtractorNotFound(name) if name == "ghost"));
  assert!(
    s.list_incidents::<OfficerInvolvedShooting>(1)
      .await
      .unwrap()
      .is_empty()
  );
}

// ─── Checkpoints & heartbeat ─────────────────────────────────────────────────

async fn with_checkpoint(s: &SqliteStore, username: &str) -> Extractor {
  let input = NewExtractor {
    checkpoint: Some(Checkpoint::new(3, 2021).unwrap()),
    ..NewExtractor::new(1, username, "unused-hash")
  };
  s.add_extractor(input).await.unwrap()
}

#[tokio::test]
async fn heartbeat_reports_checkpoint_without_clearing() {
  let s = store().await;
  with_checkpoint(&s, "ext").await;
  let body = json!({ "status": "ok", "version": 2 });

  let reply = ingest::heartbeat(&s, "ext", body.clone()).await.unwrap();
  assert_eq!(reply.received, body);
  assert_eq!(reply.next_month, Some(3));
  assert_eq!(reply.next_year, Some(2021));

  let after = s.find_extractor("ext").await.unwrap().unwrap();
  assert!(after.last_contact.is_some());
  assert_eq!(after.checkpoint, Some(Checkpoint { month: 3, year: 2021 }));
}

#[tokio::test]
async fn acknowledge_records_contact_only() {
  let s = store().await;
  with_checkpoint(&s, "ext").await;

  let ext = ingest::acknowledge(&s, "ext").await.unwrap();
  assert!(ext.last_contact.is_some());

  let after = s.find_extractor("ext").await.unwrap().unwrap();
  assert!(after.last_contact.is_some());
  assert_eq!(after.checkpoint, Some(Checkpoint { month: 3, year: 2021 }));
}

#[tokio::test]
async fn heartbeat_without_checkpoint_only_echoes() {
  let s = store().await;
  extractor(&s, 1, "ext").await;
  let reply = ingest::heartbeat(&s, "ext", json!({})).await.unwrap();
  assert_eq!(serde_json::to_value(reply).unwrap(), json!({ "received": {} }));
}

#[tokio::test]
async fn heartbeat_unknown_extractor_errors() {
  let s = store().await;
  let err = ingest::heartbeat(&s, "ghost", json!({})).await.unwrap_err();
  assert!(matches!(err, CoreError::ExtractorNotFound(_)));
}

#[tokio::test]
async fn successful_batch_clears_checkpoint_for_every_kind() {
  let s = store().await;

  with_checkpoint(&s, "uof").await;
  ingest::submit_batch::<UseOfForceIncident, _>(
    &s,
    "uof",
    &[uof("u-1", "badge-1", "Taser", "Pending")],
  )
  .await
  .unwrap();

  with_checkpoint(&s, "ois").await;
  ingest::submit_batch::<OfficerInvolvedShooting, _>(&s, "ois", &[ois("o-1", "x")])
    .await
    .unwrap();

  with_checkpoint(&s, "complaints").await;
  ingest::submit_batch::<CitizenComplaint, _>(
    &s,
    "complaints",
    &[complaint("c-1", "Rudeness", "Pending")],
  )
  .await
  .unwrap();

  for username in ["uof", "ois", "complaints"] {
    let after = s.find_extractor(username).await.unwrap().unwrap();
    assert!(after.checkpoint.is_none(), "{username} kept its checkpoint");
    assert!(after.last_contact.is_some());
  }

  let reply = ingest::heartbeat(&s, "ois", json!({})).await.unwrap();
  assert!(reply.next_month.is_none());
  assert!(reply.next_year.is_none());
}
