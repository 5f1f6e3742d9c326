//! Record type schema: the per-category description of what identifies an
//! incident (its natural key) and which fields are persisted.

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, de::DeserializeOwned};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
  DepartmentId,
  coerce::{FieldError, Payload},
};

// ─── Record kinds ────────────────────────────────────────────────────────────

/// The incident categories an extractor can submit. The string form is the
/// discriminant stored by backends.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
  UseOfForce,
  OfficerInvolvedShooting,
  CitizenComplaint,
}

impl RecordKind {
  /// The discriminant stored in the `kind` column.
  pub fn as_str(self) -> &'static str { self.into() }

  /// The route segment under `/data` that accepts batches of this kind.
  pub fn route_segment(self) -> &'static str {
    match self {
      Self::UseOfForce => "UOF",
      Self::OfficerInvolvedShooting => "OIS",
      Self::CitizenComplaint => "complaints",
    }
  }
}

// ─── Field descriptors ───────────────────────────────────────────────────────

/// How a field's value is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  /// Taken from the authenticated extractor, never from the payload.
  Identity,
  /// Non-null text.
  RequiredText,
  /// Nullable text; numbers and booleans are stringified.
  Text,
  Date,
  Integer,
  Flag,
  /// Always stored absent.
  Absent,
}

/// One persisted field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
  /// Internal (snake_case) name.
  pub column: &'static str,
  /// Literal, case-sensitive name in the extractor payload, if any.
  pub source: Option<&'static str>,
  pub kind:   FieldKind,
}

impl FieldSpec {
  pub const fn identity(column: &'static str) -> Self {
    Self { column, source: None, kind: FieldKind::Identity }
  }

  pub const fn absent(column: &'static str) -> Self {
    Self { column, source: None, kind: FieldKind::Absent }
  }

  pub const fn payload(
    column: &'static str,
    source: &'static str,
    kind: FieldKind,
  ) -> Self {
    Self { column, source: Some(source), kind }
  }
}

// ─── Update policy ───────────────────────────────────────────────────────────

/// What the engine does when an incoming record matches a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
  /// Copy every non-key field from the incoming record and persist.
  Overwrite,
  /// Leave the stored record untouched and count nothing.
  Ignore,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A concrete incident record type together with its schema.
///
/// Implementors are plain typed structs; coercion (`from_payload`) and field
/// copy (`apply_fields`) are pure functions over them.
pub trait IncidentKind:
  Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
  /// The payload-derived part of the natural key. The department is always
  /// the other part and is matched separately.
  type Key: Serialize + Clone + PartialEq + fmt::Debug + Send + Sync;

  const KIND: RecordKind;

  /// Ordered natural-key fields (internal names), department first.
  const KEY_FIELDS: &'static [&'static str];

  /// Every persisted field.
  const FIELDS: &'static [FieldSpec];

  const UPDATE_POLICY: UpdatePolicy;

  /// Build a record from a raw payload. `department_id` comes from the
  /// extractor's identity.
  fn from_payload(
    department_id: DepartmentId,
    payload: &Payload<'_>,
  ) -> Result<Self, FieldError>;

  fn department_id(&self) -> DepartmentId;

  fn opaque_id(&self) -> &str;

  fn occured_date(&self) -> NaiveDate;

  fn key(&self) -> Self::Key;

  /// Overwrite every non-key field of `self` with the incoming record's.
  fn apply_fields(&mut self, incoming: Self);
}
