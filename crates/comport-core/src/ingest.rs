//! Entry points for one inbound extractor call: resolve the extractor,
//! record contact, do the work, advance the checkpoint.

use serde_json::Value;

use crate::{
  Error, Result,
  checkpoint::{self, HeartbeatReply},
  extractor::Extractor,
  reconcile::{self, BatchSummary},
  schema::IncidentKind,
  store::{ExtractorStore, IncidentStore},
};

/// Look up the extractor behind an already-authenticated username.
pub async fn resolve_extractor<S: ExtractorStore>(
  store: &S,
  username: &str,
) -> Result<Extractor> {
  store
    .find_extractor(username)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::ExtractorNotFound(username.to_owned()))
}

/// Resolve the extractor and record that it called in. Every inbound call
/// does this first, including calls whose body is later rejected.
pub async fn acknowledge<S: ExtractorStore>(
  store: &S,
  username: &str,
) -> Result<Extractor> {
  let mut extractor = resolve_extractor(store, username).await?;
  checkpoint::record_contact(store, &mut extractor).await?;
  Ok(extractor)
}

/// Handle a heartbeat. The checkpoint is reported, never cleared.
pub async fn heartbeat<S: ExtractorStore>(
  store: &S,
  username: &str,
  body: Value,
) -> Result<HeartbeatReply> {
  let extractor = acknowledge(store, username).await?;
  Ok(HeartbeatReply::new(body, extractor.checkpoint))
}

/// Handle one batch of `R` records from `username`.
///
/// The department comes from the extractor record. Contact is recorded before
/// any record is processed; the checkpoint is cleared only if every record
/// reconciles.
pub async fn submit_batch<R, S>(
  store: &S,
  username: &str,
  batch: &[Value],
) -> Result<BatchSummary>
where
  R: IncidentKind,
  S: IncidentStore + ExtractorStore,
{
  let mut extractor = acknowledge(store, username).await?;

  let summary =
    reconcile::reconcile::<R, S>(store, extractor.department_id, batch).await?;

  checkpoint::clear_checkpoint(store, &mut extractor).await?;
  Ok(summary)
}
