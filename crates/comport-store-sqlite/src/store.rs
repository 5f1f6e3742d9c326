//! [`SqliteStore`], the SQLite implementation of [`IncidentStore`] and
//! [`ExtractorStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use comport_core::{
  DepartmentId,
  extractor::{Checkpoint, Extractor, NewExtractor},
  schema::IncidentKind,
  store::{ExtractorStore, IncidentStore, StoredIncident},
};

use crate::{
  Error, Result,
  encode::{
    IncidentColumns, RawExtractor, RawIncident, encode_checkpoint, encode_dt,
    encode_key, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A comport store backed by a single SQLite file.
///
/// Every method is a single statement, so each write commits on its own.
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_incidents(
    &self,
    kind: &'static str,
    department_id: DepartmentId,
    natural_key: Option<String>,
  ) -> Result<Vec<RawIncident>> {
    let raws = self
      .conn
      .call(move |conn| {
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawIncident> {
          Ok(RawIncident {
            incident_id: row.get(0)?,
            record_json: row.get(1)?,
            created_at:  row.get(2)?,
            updated_at:  row.get(3)?,
          })
        };

        let rows = if let Some(key) = natural_key {
          let mut stmt = conn.prepare(
            "SELECT incident_id, record_json, created_at, updated_at
             FROM incidents
             WHERE kind = ?1 AND department_id = ?2 AND natural_key = ?3",
          )?;
          stmt
            .query_map(rusqlite::params![kind, department_id, key], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT incident_id, record_json, created_at, updated_at
             FROM incidents
             WHERE kind = ?1 AND department_id = ?2
             ORDER BY rowid",
          )?;
          stmt
            .query_map(rusqlite::params![kind, department_id], map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;
    Ok(raws)
  }
}

// ─── IncidentStore impl ──────────────────────────────────────────────────────

impl IncidentStore for SqliteStore {
  type Error = Error;

  async fn find_incident<R: IncidentKind>(
    &self,
    department_id: DepartmentId,
    key: &R::Key,
  ) -> Result<Option<StoredIncident<R>>> {
    let natural_key = encode_key::<R>(key)?;
    let raws = self
      .query_incidents(R::KIND.as_str(), department_id, Some(natural_key))
      .await?;
    // The UNIQUE constraint allows at most one row.
    raws.into_iter().next().map(RawIncident::into_stored).transpose()
  }

  async fn create_incident<R: IncidentKind>(
    &self,
    record: R,
  ) -> Result<StoredIncident<R>> {
    let now = Utc::now();
    let incident = StoredIncident {
      incident_id: Uuid::new_v4(),
      created_at:  now,
      updated_at:  now,
      record,
    };
    let cols = IncidentColumns::from_stored(&incident)?;
    let kind          = cols.kind;
    let department_id = cols.department_id;
    let natural_key   = cols.natural_key.clone();

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO incidents (
             incident_id, kind, department_id, natural_key, opaque_id,
             occured_date, record_json, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT (kind, department_id, natural_key) DO NOTHING",
          rusqlite::params![
            cols.incident_id,
            cols.kind,
            cols.department_id,
            cols.natural_key,
            cols.opaque_id,
            cols.occured_date,
            cols.record_json,
            cols.created_at,
            cols.updated_at,
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::DuplicateKey { kind, department_id, natural_key });
    }
    Ok(incident)
  }

  async fn update_incident<R: IncidentKind>(
    &self,
    incident: &StoredIncident<R>,
  ) -> Result<StoredIncident<R>> {
    let updated = StoredIncident {
      updated_at: Utc::now(),
      ..incident.clone()
    };
    let cols = IncidentColumns::from_stored(&updated)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE incidents
           SET natural_key = ?1, opaque_id = ?2, occured_date = ?3,
               record_json = ?4, updated_at = ?5
           WHERE incident_id = ?6 AND kind = ?7",
          rusqlite::params![
            cols.natural_key,
            cols.opaque_id,
            cols.occured_date,
            cols.record_json,
            cols.updated_at,
            cols.incident_id,
            cols.kind,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::IncidentNotFound(incident.incident_id));
    }
    Ok(updated)
  }

  async fn list_incidents<R: IncidentKind>(
    &self,
    department_id: DepartmentId,
  ) -> Result<Vec<StoredIncident<R>>> {
    self
      .query_incidents(R::KIND.as_str(), department_id, None)
      .await?
      .into_iter()
      .map(RawIncident::into_stored)
      .collect()
  }
}

// ─── ExtractorStore impl ─────────────────────────────────────────────────────

impl ExtractorStore for SqliteStore {
  type Error = Error;

  async fn add_extractor(&self, input: NewExtractor) -> Result<Extractor> {
    let extractor = Extractor {
      extractor_id:  Uuid::new_v4(),
      department_id: input.department_id,
      username:      input.username,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
      last_contact:  None,
      checkpoint:    input.checkpoint,
    };

    let id_str        = encode_uuid(extractor.extractor_id);
    let department_id = extractor.department_id;
    let username      = extractor.username.clone();
    let password_hash = extractor.password_hash.clone();
    let at_str        = encode_dt(extractor.created_at);
    let (month, year) = encode_checkpoint(extractor.checkpoint);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO extractors (
             extractor_id, department_id, username, password_hash,
             created_at, next_month, next_year
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (username) DO NOTHING",
          rusqlite::params![
            id_str,
            department_id,
            username,
            password_hash,
            at_str,
            month,
            year,
          ],
        )?)
      })
      .await?;

    if inserted == 0 {
      return Err(Error::UsernameTaken(extractor.username));
    }
    Ok(extractor)
  }

  async fn find_extractor(&self, username: &str) -> Result<Option<Extractor>> {
    let username = username.to_owned();

    let raw: Option<RawExtractor> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT extractor_id, department_id, username, password_hash,
                    created_at, last_contact, next_month, next_year
             FROM extractors WHERE username = ?1",
            rusqlite::params![username],
            |row| {
              Ok(RawExtractor {
                extractor_id:  row.get(0)?,
                department_id: row.get(1)?,
                username:      row.get(2)?,
                password_hash: row.get(3)?,
                created_at:    row.get(4)?,
                last_contact:  row.get(5)?,
                next_month:    row.get(6)?,
                next_year:     row.get(7)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawExtractor::into_extractor).transpose()
  }

  async fn touch_extractor(&self, extractor_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(extractor_id);
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE extractors SET last_contact = ?1 WHERE extractor_id = ?2",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ExtractorNotFound(extractor_id));
    }
    Ok(())
  }

  async fn set_checkpoint(
    &self,
    extractor_id: Uuid,
    checkpoint: Option<Checkpoint>,
  ) -> Result<()> {
    let id_str        = encode_uuid(extractor_id);
    let (month, year) = encode_checkpoint(checkpoint);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE extractors SET next_month = ?1, next_year = ?2
           WHERE extractor_id = ?3",
          rusqlite::params![month, year, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ExtractorNotFound(extractor_id));
    }
    tracing::debug!(%extractor_id, ?checkpoint, "checkpoint set");
    Ok(())
  }
}
