//! Handlers for the extractor endpoints.
//!
//! Every handler resolves the caller from [`ExtractorIdentity`]; the
//! department a batch belongs to always comes from the extractor record, never
//! from the payload.

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::{State, rejection::JsonRejection},
  http::{HeaderMap, header},
};
use comport_core::{
  checkpoint::HeartbeatReply,
  ingest,
  reconcile::BatchSummary,
  schema::IncidentKind,
  store::{ExtractorStore, IncidentStore},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, identity::ExtractorIdentity};

fn rejected(identity: &ExtractorIdentity, err: comport_core::Error) -> ApiError {
  tracing::warn!(username = %identity.username, error = %err, "rejected extractor call");
  ApiError::from(err)
}

/// Record contact for a call whose body is being rejected, then hand back
/// `err`. Contact is kept even though the call fails.
async fn reject_after_contact<S: ExtractorStore>(
  store: &S,
  identity: &ExtractorIdentity,
  err: ApiError,
) -> ApiError {
  match ingest::acknowledge(store, &identity.username).await {
    Ok(_) => {
      tracing::warn!(username = %identity.username, error = %err, "rejected extractor body");
      err
    }
    Err(e) => rejected(identity, e),
  }
}

// ─── Heartbeat ───────────────────────────────────────────────────────────────

/// `POST /heartbeat`: echoes the body and reports any pending checkpoint.
///
/// A body that is empty or not declared as JSON is echoed as `null`.
pub async fn heartbeat<S>(
  State(store): State<Arc<S>>,
  identity: ExtractorIdentity,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<HeartbeatReply>, ApiError>
where
  S: ExtractorStore,
{
  let body = match heartbeat_body(&headers, &body) {
    Ok(value) => value,
    Err(e) => return Err(reject_after_contact(store.as_ref(), &identity, e).await),
  };
  let reply = ingest::heartbeat(store.as_ref(), &identity.username, body)
    .await
    .map_err(|e| rejected(&identity, e))?;
  Ok(Json(reply))
}

fn heartbeat_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, ApiError> {
  if !declares_json(headers) || body.trim_ascii().is_empty() {
    return Ok(Value::Null);
  }
  serde_json::from_slice(body)
    .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

/// `application/json` or any `+json` media type.
fn declares_json(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(';').next())
    .map(|essence| {
      let essence = essence.trim().to_ascii_lowercase();
      essence == "application/json" || essence.ends_with("+json")
    })
    .unwrap_or(false)
}

// ─── Batches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub data: Vec<Value>,
}

/// `POST /UOF`, `/OIS`, `/complaints`, body: `{"data": [...]}`
pub async fn batch<S, R>(
  State(store): State<Arc<S>>,
  identity: ExtractorIdentity,
  body: Result<Json<BatchBody>, JsonRejection>,
) -> Result<Json<BatchSummary>, ApiError>
where
  S: IncidentStore + ExtractorStore,
  R: IncidentKind,
{
  let body = match body {
    Ok(Json(body)) => body,
    Err(rejection) => {
      let err = ApiError::from(rejection);
      return Err(reject_after_contact(store.as_ref(), &identity, err).await);
    }
  };
  let summary =
    ingest::submit_batch::<R, S>(store.as_ref(), &identity.username, &body.data)
      .await
      .map_err(|e| rejected(&identity, e))?;
  Ok(Json(summary))
}
