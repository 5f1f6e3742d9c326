//! Field coercion: pure conversions from loosely-typed JSON payload values
//! into the typed values stored on incident records.
//!
//! Every field a record type declares must be present in the payload. A JSON
//! `null` is accepted for optional fields and becomes `None`; nothing is ever
//! defaulted.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field name reported when a batch entry is not a JSON object at all.
pub const RECORD_FIELD: &str = "data";

// ─── Errors ──────────────────────────────────────────────────────────────────

/// What went wrong while coercing a single field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldProblem {
  #[error("missing")]
  Missing,

  #[error("expected a JSON object")]
  NotAnObject,

  #[error("expected {expected}")]
  WrongType { expected: &'static str },

  #[error("cannot parse {raw:?} as {expected}")]
  Unparsable { expected: &'static str, raw: String },
}

/// A coercion failure, tagged with the external (payload) field name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` {problem}")]
pub struct FieldError {
  pub field:   &'static str,
  pub problem: FieldProblem,
}

impl FieldError {
  pub fn new(field: &'static str, problem: FieldProblem) -> Self {
    Self { field, problem }
  }
}

// ─── Raw-string parsers ──────────────────────────────────────────────────────

/// Parse an extractor-supplied date. Accepts a bare ISO date or an ISO
/// date-time (space or `T` separated, optional fractional seconds); the time
/// component is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let raw = raw.trim();
  if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Some(date);
  }
  for format in [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
  ] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
      return Some(dt.date());
    }
  }
  None
}

/// Parse a base-10 integer, ignoring surrounding whitespace.
pub fn parse_int(raw: &str) -> Option<i64> { raw.trim().parse().ok() }

/// Parse a yes/no style flag.
pub fn parse_flag(raw: &str) -> Option<bool> {
  match raw.trim().to_ascii_lowercase().as_str() {
    "true" | "yes" | "y" | "1" => Some(true),
    "false" | "no" | "n" | "0" => Some(false),
    _ => None,
  }
}

// ─── Value coercers ──────────────────────────────────────────────────────────

pub fn coerce_text(value: &Value) -> Result<Option<String>, FieldProblem> {
  match value {
    Value::Null => Ok(None),
    Value::String(s) => Ok(Some(s.clone())),
    Value::Number(n) => Ok(Some(n.to_string())),
    Value::Bool(b) => Ok(Some(b.to_string())),
    Value::Array(_) | Value::Object(_) => {
      Err(FieldProblem::WrongType { expected: "a scalar value" })
    }
  }
}

pub fn coerce_date(value: &Value) -> Result<NaiveDate, FieldProblem> {
  match value {
    Value::Null => Err(FieldProblem::Missing),
    Value::String(s) if s.trim().is_empty() => Err(FieldProblem::Missing),
    Value::String(s) => parse_date(s).ok_or_else(|| FieldProblem::Unparsable {
      expected: "a date",
      raw:      s.clone(),
    }),
    _ => Err(FieldProblem::WrongType { expected: "a date string" }),
  }
}

pub fn coerce_int(value: &Value) -> Result<Option<i64>, FieldProblem> {
  match value {
    Value::Null => Ok(None),
    // Blank cells from spreadsheet exports mean "unknown".
    Value::String(s) if s.trim().is_empty() => Ok(None),
    Value::String(s) => parse_int(s).map(Some).ok_or_else(|| {
      FieldProblem::Unparsable { expected: "an integer", raw: s.clone() }
    }),
    Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| {
      FieldProblem::Unparsable { expected: "an integer", raw: n.to_string() }
    }),
    _ => Err(FieldProblem::WrongType { expected: "an integer" }),
  }
}

pub fn coerce_flag(value: &Value) -> Result<Option<bool>, FieldProblem> {
  match value {
    Value::Null => Ok(None),
    Value::Bool(b) => Ok(Some(*b)),
    Value::String(s) if s.trim().is_empty() => Ok(None),
    Value::String(s) => parse_flag(s).map(Some).ok_or_else(|| {
      FieldProblem::Unparsable { expected: "a yes/no flag", raw: s.clone() }
    }),
    Value::Number(n) => match n.as_i64() {
      Some(0) => Ok(Some(false)),
      Some(1) => Ok(Some(true)),
      _ => Err(FieldProblem::Unparsable {
        expected: "a yes/no flag",
        raw:      n.to_string(),
      }),
    },
    _ => Err(FieldProblem::WrongType { expected: "a yes/no flag" }),
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// A borrowed view over one raw incident payload, addressed by external
/// (camelCase) field names.
#[derive(Debug, Clone, Copy)]
pub struct Payload<'a> {
  fields: &'a Map<String, Value>,
}

impl<'a> Payload<'a> {
  pub fn new(value: &'a Value) -> Result<Self, FieldError> {
    value
      .as_object()
      .map(|fields| Self { fields })
      .ok_or(FieldError::new(RECORD_FIELD, FieldProblem::NotAnObject))
  }

  fn raw(&self, field: &'static str) -> Result<&'a Value, FieldError> {
    self
      .fields
      .get(field)
      .ok_or(FieldError::new(field, FieldProblem::Missing))
  }

  pub fn text(&self, field: &'static str) -> Result<Option<String>, FieldError> {
    coerce_text(self.raw(field)?).map_err(|p| FieldError::new(field, p))
  }

  /// Like [`Payload::text`] but `null` is rejected.
  pub fn required_text(&self, field: &'static str) -> Result<String, FieldError> {
    self
      .text(field)?
      .ok_or(FieldError::new(field, FieldProblem::Missing))
  }

  pub fn date(&self, field: &'static str) -> Result<NaiveDate, FieldError> {
    coerce_date(self.raw(field)?).map_err(|p| FieldError::new(field, p))
  }

  pub fn int(&self, field: &'static str) -> Result<Option<i64>, FieldError> {
    coerce_int(self.raw(field)?).map_err(|p| FieldError::new(field, p))
  }

  pub fn flag(&self, field: &'static str) -> Result<Option<bool>, FieldError> {
    coerce_flag(self.raw(field)?).map_err(|p| FieldError::new(field, p))
  }
}
