//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates as `YYYY-MM-DD`, UUIDs as
//! hyphenated lowercase strings. Incident records and natural keys are stored
//! as compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use comport_core::{
  extractor::{Checkpoint, Extractor},
  schema::IncidentKind,
  store::StoredIncident,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

// ─── Incidents ───────────────────────────────────────────────────────────────

/// Canonical JSON for a natural key. Field order is fixed by the key struct,
/// so equal keys always encode to equal strings.
pub fn encode_key<R: IncidentKind>(key: &R::Key) -> Result<String> {
  Ok(serde_json::to_string(key)?)
}

pub fn encode_record<R: IncidentKind>(record: &R) -> Result<String> {
  Ok(serde_json::to_string(record)?)
}

/// Column values for an `incidents` row, computed up front so they can be
/// moved into a `tokio_rusqlite` closure.
pub struct IncidentColumns {
  pub incident_id:   String,
  pub kind:          &'static str,
  pub department_id: i64,
  pub natural_key:   String,
  pub opaque_id:     String,
  pub occured_date:  String,
  pub record_json:   String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl IncidentColumns {
  pub fn from_stored<R: IncidentKind>(incident: &StoredIncident<R>) -> Result<Self> {
    let record = &incident.record;
    Ok(Self {
      incident_id:   encode_uuid(incident.incident_id),
      kind:          R::KIND.as_str(),
      department_id: record.department_id(),
      natural_key:   encode_key::<R>(&record.key())?,
      opaque_id:     record.opaque_id().to_owned(),
      occured_date:  encode_date(record.occured_date()),
      record_json:   encode_record(record)?,
      created_at:    encode_dt(incident.created_at),
      updated_at:    encode_dt(incident.updated_at),
    })
  }
}

/// Raw strings read directly from an `incidents` row.
pub struct RawIncident {
  pub incident_id: String,
  pub record_json: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawIncident {
  pub fn into_stored<R: IncidentKind>(self) -> Result<StoredIncident<R>> {
    Ok(StoredIncident {
      incident_id: decode_uuid(&self.incident_id)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
      record:      serde_json::from_str(&self.record_json)?,
    })
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Split a checkpoint into its two nullable columns.
pub fn encode_checkpoint(c: Option<Checkpoint>) -> (Option<u32>, Option<i32>) {
  match c {
    Some(c) => (Some(c.month), Some(c.year)),
    None => (None, None),
  }
}

/// A checkpoint is pending only when both columns are set and non-zero.
pub fn decode_checkpoint(
  month: Option<u32>,
  year: Option<i32>,
) -> Result<Option<Checkpoint>> {
  match (month, year) {
    (Some(m), Some(y)) if m != 0 && y != 0 => Ok(Some(Checkpoint::new(m, y)?)),
    _ => Ok(None),
  }
}

/// Raw values read directly from an `extractors` row.
pub struct RawExtractor {
  pub extractor_id:  String,
  pub department_id: i64,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
  pub last_contact:  Option<String>,
  pub next_month:    Option<u32>,
  pub next_year:     Option<i32>,
}

impl RawExtractor {
  pub fn into_extractor(self) -> Result<Extractor> {
    Ok(Extractor {
      extractor_id:  decode_uuid(&self.extractor_id)?,
      department_id: self.department_id,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
      last_contact:  self.last_contact.as_deref().map(decode_dt).transpose()?,
      checkpoint:    decode_checkpoint(self.next_month, self.next_year)?,
    })
  }
}
