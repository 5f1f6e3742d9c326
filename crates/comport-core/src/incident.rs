//! The three incident record types submitted by extractors.
//!
//! Each type is an explicit typed struct. Its serde form uses the same
//! camelCase names extractors submit, so a stored record reads like the
//! payload it came from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  DepartmentId,
  coerce::{FieldError, Payload},
  schema::{FieldKind, FieldSpec, IncidentKind, RecordKind, UpdatePolicy},
};

use FieldKind::{Date, Flag, Integer, RequiredText, Text};

// ─── Use of force ────────────────────────────────────────────────────────────

/// One officer's use of one type of force during an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseOfForceIncident {
  pub department_id:            DepartmentId,
  pub opaque_id:                String,
  pub occured_date:             NaiveDate,
  pub division:                 Option<String>,
  pub precinct:                 Option<String>,
  pub shift:                    Option<String>,
  pub beat:                     Option<String>,
  pub disposition:              Option<String>,
  pub census_tract:             Option<String>,
  pub officer_force_type:       Option<String>,
  pub use_of_force_reason:      Option<String>,
  pub service_type:             Option<String>,
  pub arrest_made:              Option<bool>,
  pub arrest_charges:           Option<String>,
  pub resident_weapon_used:     Option<String>,
  pub resident_injured:         Option<bool>,
  pub resident_hospitalized:    Option<bool>,
  pub officer_injured:          Option<bool>,
  pub officer_hospitalized:     Option<bool>,
  pub resident_race:            Option<String>,
  pub resident_sex:             Option<String>,
  pub resident_age:             Option<String>,
  pub resident_condition:       Option<String>,
  pub officer_identifier:       Option<String>,
  pub officer_race:             Option<String>,
  pub officer_sex:              Option<String>,
  pub officer_age:              Option<String>,
  pub officer_years_of_service: Option<String>,
  pub officer_condition:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UseOfForceKey {
  pub opaque_id:          String,
  pub officer_identifier: Option<String>,
  pub officer_force_type: Option<String>,
}

impl IncidentKind for UseOfForceIncident {
  type Key = UseOfForceKey;

  const KIND: RecordKind = RecordKind::UseOfForce;

  const KEY_FIELDS: &'static [&'static str] = &[
    "department_id",
    "opaque_id",
    "officer_identifier",
    "officer_force_type",
  ];

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::identity("department_id"),
    FieldSpec::payload("opaque_id", "opaqueId", RequiredText),
    FieldSpec::payload("occured_date", "occuredDate", Date),
    FieldSpec::payload("division", "division", Text),
    FieldSpec::payload("precinct", "precinct", Text),
    FieldSpec::payload("shift", "shift", Text),
    FieldSpec::payload("beat", "beat", Text),
    FieldSpec::payload("disposition", "disposition", Text),
    FieldSpec::absent("census_tract"),
    FieldSpec::payload("officer_force_type", "officerForceType", Text),
    FieldSpec::payload("use_of_force_reason", "useOfForceReason", Text),
    FieldSpec::payload("service_type", "serviceType", Text),
    FieldSpec::payload("arrest_made", "arrestMade", Flag),
    FieldSpec::payload("arrest_charges", "arrestCharges", Text),
    FieldSpec::payload("resident_weapon_used", "residentWeaponUsed", Text),
    FieldSpec::payload("resident_injured", "residentInjured", Flag),
    FieldSpec::payload("resident_hospitalized", "residentHospitalized", Flag),
    FieldSpec::payload("officer_injured", "officerInjured", Flag),
    FieldSpec::payload("officer_hospitalized", "officerHospitalized", Flag),
    FieldSpec::payload("resident_race", "residentRace", Text),
    FieldSpec::payload("resident_sex", "residentSex", Text),
    FieldSpec::payload("resident_age", "residentAge", Text),
    FieldSpec::payload("resident_condition", "residentCondition", Text),
    FieldSpec::payload("officer_identifier", "officerIdentifier", Text),
    FieldSpec::payload("officer_race", "officerRace", Text),
    FieldSpec::payload("officer_sex", "officerSex", Text),
    FieldSpec::payload("officer_age", "officerAge", Text),
    FieldSpec::payload("officer_years_of_service", "officerYearsOfService", Text),
    FieldSpec::payload("officer_condition", "officerCondition", Text),
  ];

  const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::Overwrite;

  fn from_payload(
    department_id: DepartmentId,
    payload: &Payload<'_>,
  ) -> Result<Self, FieldError> {
    Ok(Self {
      occured_date: payload.date("occuredDate")?,
      department_id,
      opaque_id: payload.required_text("opaqueId")?,
      division: payload.text("division")?,
      precinct: payload.text("precinct")?,
      shift: payload.text("shift")?,
      beat: payload.text("beat")?,
      disposition: payload.text("disposition")?,
      census_tract: None,
      officer_force_type: payload.text("officerForceType")?,
      use_of_force_reason: payload.text("useOfForceReason")?,
      service_type: payload.text("serviceType")?,
      arrest_made: payload.flag("arrestMade")?,
      arrest_charges: payload.text("arrestCharges")?,
      resident_weapon_used: payload.text("residentWeaponUsed")?,
      resident_injured: payload.flag("residentInjured")?,
      resident_hospitalized: payload.flag("residentHospitalized")?,
      officer_injured: payload.flag("officerInjured")?,
      officer_hospitalized: payload.flag("officerHospitalized")?,
      resident_race: payload.text("residentRace")?,
      resident_sex: payload.text("residentSex")?,
      resident_age: payload.text("residentAge")?,
      resident_condition: payload.text("residentCondition")?,
      officer_identifier: payload.text("officerIdentifier")?,
      officer_race: payload.text("officerRace")?,
      officer_sex: payload.text("officerSex")?,
      officer_age: payload.text("officerAge")?,
      officer_years_of_service: payload.text("officerYearsOfService")?,
      officer_condition: payload.text("officerCondition")?,
    })
  }

  fn department_id(&self) -> DepartmentId { self.department_id }

  fn opaque_id(&self) -> &str { &self.opaque_id }

  fn occured_date(&self) -> NaiveDate { self.occured_date }

  fn key(&self) -> UseOfForceKey {
    UseOfForceKey {
      opaque_id:          self.opaque_id.clone(),
      officer_identifier: self.officer_identifier.clone(),
      officer_force_type: self.officer_force_type.clone(),
    }
  }

  fn apply_fields(&mut self, incoming: Self) {
    *self = Self {
      department_id: self.department_id,
      opaque_id: std::mem::take(&mut self.opaque_id),
      officer_identifier: self.officer_identifier.take(),
      officer_force_type: self.officer_force_type.take(),
      ..incoming
    };
  }
}

// ─── Officer-involved shooting ───────────────────────────────────────────────

/// An officer-involved shooting. Identified by its opaque id alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficerInvolvedShooting {
  pub department_id:            DepartmentId,
  pub opaque_id:                String,
  pub service_type:             Option<String>,
  pub occured_date:             NaiveDate,
  pub division:                 Option<String>,
  pub precinct:                 Option<String>,
  pub shift:                    Option<String>,
  pub beat:                     Option<String>,
  pub disposition:              Option<String>,
  pub resident_sex:             Option<String>,
  pub resident_race:            Option<String>,
  pub resident_age:             Option<String>,
  pub resident_weapon_used:     Option<String>,
  pub resident_condition:       Option<String>,
  pub officer_identifier:       Option<String>,
  pub officer_force_type:       Option<String>,
  pub officer_race:             Option<String>,
  pub officer_sex:              Option<String>,
  pub officer_age:              Option<String>,
  pub officer_years_of_service: Option<i64>,
  pub officer_condition:        Option<String>,
  pub census_tract:             Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficerInvolvedShootingKey {
  pub opaque_id: String,
}

impl IncidentKind for OfficerInvolvedShooting {
  type Key = OfficerInvolvedShootingKey;

  const KIND: RecordKind = RecordKind::OfficerInvolvedShooting;

  const KEY_FIELDS: &'static [&'static str] = &["department_id", "opaque_id"];

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::identity("department_id"),
    FieldSpec::payload("opaque_id", "opaqueId", RequiredText),
    FieldSpec::payload("service_type", "serviceType", Text),
    FieldSpec::payload("occured_date", "occuredDate", Date),
    FieldSpec::payload("division", "division", Text),
    FieldSpec::payload("precinct", "precinct", Text),
    FieldSpec::payload("shift", "shift", Text),
    FieldSpec::payload("beat", "beat", Text),
    FieldSpec::payload("disposition", "disposition", Text),
    FieldSpec::payload("resident_sex", "residentSex", Text),
    FieldSpec::payload("resident_race", "residentRace", Text),
    FieldSpec::payload("resident_age", "residentAge", Text),
    FieldSpec::payload("resident_weapon_used", "residentWeaponUsed", Text),
    FieldSpec::payload("resident_condition", "residentCondition", Text),
    FieldSpec::payload("officer_identifier", "officerIdentifier", Text),
    FieldSpec::payload("officer_force_type", "officerForceType", Text),
    FieldSpec::payload("officer_race", "officerRace", Text),
    FieldSpec::payload("officer_sex", "officerSex", Text),
    FieldSpec::payload("officer_age", "officerAge", Text),
    FieldSpec::payload("officer_years_of_service", "officerYearsOfService", Integer),
    FieldSpec::payload("officer_condition", "officerCondition", Text),
    FieldSpec::absent("census_tract"),
  ];

  const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::Overwrite;

  fn from_payload(
    department_id: DepartmentId,
    payload: &Payload<'_>,
  ) -> Result<Self, FieldError> {
    Ok(Self {
      occured_date: payload.date("occuredDate")?,
      department_id,
      opaque_id: payload.required_text("opaqueId")?,
      service_type: payload.text("serviceType")?,
      division: payload.text("division")?,
      precinct: payload.text("precinct")?,
      shift: payload.text("shift")?,
      beat: payload.text("beat")?,
      disposition: payload.text("disposition")?,
      resident_sex: payload.text("residentSex")?,
      resident_race: payload.text("residentRace")?,
      resident_age: payload.text("residentAge")?,
      resident_weapon_used: payload.text("residentWeaponUsed")?,
      resident_condition: payload.text("residentCondition")?,
      officer_identifier: payload.text("officerIdentifier")?,
      officer_force_type: payload.text("officerForceType")?,
      officer_race: payload.text("officerRace")?,
      officer_sex: payload.text("officerSex")?,
      officer_age: payload.text("officerAge")?,
      officer_years_of_service: payload.int("officerYearsOfService")?,
      officer_condition: payload.text("officerCondition")?,
      census_tract: None,
    })
  }

  fn department_id(&self) -> DepartmentId { self.department_id }

  fn opaque_id(&self) -> &str { &self.opaque_id }

  fn occured_date(&self) -> NaiveDate { self.occured_date }

  fn key(&self) -> OfficerInvolvedShootingKey {
    OfficerInvolvedShootingKey { opaque_id: self.opaque_id.clone() }
  }

  fn apply_fields(&mut self, incoming: Self) {
    *self = Self {
      department_id: self.department_id,
      opaque_id: std::mem::take(&mut self.opaque_id),
      ..incoming
    };
  }
}

// ─── Citizen complaint ───────────────────────────────────────────────────────

/// One allegation against one officer within a citizen complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenComplaint {
  pub department_id:            DepartmentId,
  pub opaque_id:                String,
  pub occured_date:             NaiveDate,
  pub service_type:             Option<String>,
  pub source:                   Option<String>,
  pub division:                 Option<String>,
  pub precinct:                 Option<String>,
  pub shift:                    Option<String>,
  pub beat:                     Option<String>,
  pub allegation_type:          Option<String>,
  pub allegation:               Option<String>,
  pub disposition:              Option<String>,
  pub resident_race:            Option<String>,
  pub resident_sex:             Option<String>,
  pub resident_age:             Option<String>,
  pub officer_identifier:       Option<String>,
  pub officer_race:             Option<String>,
  pub officer_sex:              Option<String>,
  pub officer_age:              Option<String>,
  pub officer_years_of_service: Option<String>,
  pub census_tract:             Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitizenComplaintKey {
  pub opaque_id:          String,
  pub allegation_type:    Option<String>,
  pub allegation:         Option<String>,
  pub officer_identifier: Option<String>,
}

impl IncidentKind for CitizenComplaint {
  type Key = CitizenComplaintKey;

  const KIND: RecordKind = RecordKind::CitizenComplaint;

  const KEY_FIELDS: &'static [&'static str] = &[
    "department_id",
    "opaque_id",
    "allegation_type",
    "allegation",
    "officer_identifier",
  ];

  const FIELDS: &'static [FieldSpec] = &[
    FieldSpec::identity("department_id"),
    FieldSpec::payload("opaque_id", "opaqueId", RequiredText),
    FieldSpec::payload("occured_date", "occuredDate", Date),
    FieldSpec::payload("service_type", "serviceType", Text),
    FieldSpec::payload("source", "source", Text),
    FieldSpec::payload("division", "division", Text),
    FieldSpec::payload("precinct", "precinct", Text),
    FieldSpec::payload("shift", "shift", Text),
    FieldSpec::payload("beat", "beat", Text),
    FieldSpec::payload("allegation_type", "allegationType", Text),
    FieldSpec::payload("allegation", "allegation", Text),
    FieldSpec::payload("disposition", "disposition", Text),
    FieldSpec::payload("resident_race", "residentRace", Text),
    FieldSpec::payload("resident_sex", "residentSex", Text),
    FieldSpec::payload("resident_age", "residentAge", Text),
    FieldSpec::payload("officer_identifier", "officerIdentifier", Text),
    FieldSpec::payload("officer_race", "officerRace", Text),
    FieldSpec::payload("officer_sex", "officerSex", Text),
    FieldSpec::payload("officer_age", "officerAge", Text),
    FieldSpec::payload("officer_years_of_service", "officerYearsOfService", Text),
    FieldSpec::absent("census_tract"),
  ];

  // Matching complaints are left untouched; see DESIGN.md.
  const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::Ignore;

  fn from_payload(
    department_id: DepartmentId,
    payload: &Payload<'_>,
  ) -> Result<Self, FieldError> {
    Ok(Self {
      occured_date: payload.date("occuredDate")?,
      department_id,
      opaque_id: payload.required_text("opaqueId")?,
      service_type: payload.text("serviceType")?,
      source: payload.text("source")?,
      division: payload.text("division")?,
      precinct: payload.text("precinct")?,
      shift: payload.text("shift")?,
      beat: payload.text("beat")?,
      allegation_type: payload.text("allegationType")?,
      allegation: payload.text("allegation")?,
      disposition: payload.text("disposition")?,
      resident_race: payload.text("residentRace")?,
      resident_sex: payload.text("residentSex")?,
      resident_age: payload.text("residentAge")?,
      officer_identifier: payload.text("officerIdentifier")?,
      officer_race: payload.text("officerRace")?,
      officer_sex: payload.text("officerSex")?,
      officer_age: payload.text("officerAge")?,
      officer_years_of_service: payload.text("officerYearsOfService")?,
      census_tract: None,
    })
  }

  fn department_id(&self) -> DepartmentId { self.department_id }

  fn opaque_id(&self) -> &str { &self.opaque_id }

  fn occured_date(&self) -> NaiveDate { self.occured_date }

  fn key(&self) -> CitizenComplaintKey {
    CitizenComplaintKey {
      opaque_id:          self.opaque_id.clone(),
      allegation_type:    self.allegation_type.clone(),
      allegation:         self.allegation.clone(),
      officer_identifier: self.officer_identifier.clone(),
    }
  }

  fn apply_fields(&mut self, incoming: Self) {
    *self = Self {
      department_id: self.department_id,
      opaque_id: std::mem::take(&mut self.opaque_id),
      allegation_type: self.allegation_type.take(),
      allegation: self.allegation.take(),
      officer_identifier: self.officer_identifier.take(),
      ..incoming
    };
  }
}
