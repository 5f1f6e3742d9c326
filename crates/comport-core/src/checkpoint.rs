//! Checkpoint tracker: last-contact bookkeeping and the backfill resume point.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::{
  Error, Result,
  extractor::{Checkpoint, Extractor},
  store::ExtractorStore,
};

/// Record that `extractor` called in just now.
pub async fn record_contact<S: ExtractorStore>(
  store: &S,
  extractor: &mut Extractor,
) -> Result<()> {
  let now = Utc::now();
  store
    .touch_extractor(extractor.extractor_id, now)
    .await
    .map_err(Error::store)?;
  extractor.last_contact = Some(now);
  Ok(())
}

/// Drop any pending backfill checkpoint.
pub async fn clear_checkpoint<S: ExtractorStore>(
  store: &S,
  extractor: &mut Extractor,
) -> Result<()> {
  store
    .set_checkpoint(extractor.extractor_id, None)
    .await
    .map_err(Error::store)?;
  extractor.checkpoint = None;
  Ok(())
}

/// Start (or move) a backfill: the extractor will be told to resume from
/// `checkpoint` on its next heartbeat.
pub async fn set_checkpoint<S: ExtractorStore>(
  store: &S,
  extractor: &mut Extractor,
  checkpoint: Checkpoint,
) -> Result<()> {
  store
    .set_checkpoint(extractor.extractor_id, Some(checkpoint))
    .await
    .map_err(Error::store)?;
  extractor.checkpoint = Some(checkpoint);
  Ok(())
}

/// Reply to a heartbeat: the caller's body echoed back, plus the pending
/// checkpoint if there is one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatReply {
  pub received:   Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_month: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_year:  Option<i32>,
}

impl HeartbeatReply {
  pub fn new(received: Value, checkpoint: Option<Checkpoint>) -> Self {
    Self {
      received,
      next_month: checkpoint.map(|c| c.month),
      next_year: checkpoint.map(|c| c.year),
    }
  }
}
