//! JSON ingestion API for comport extractors.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`IncidentStore`] and [`ExtractorStore`]. Authentication is the caller's
//! responsibility: it must put an [`ExtractorIdentity`] into the request
//! extensions before these handlers run.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/data", comport_api::data_router(store.clone()))
//! ```

pub mod data;
pub mod error;
pub mod identity;

use std::sync::Arc;

use axum::{Router, routing::post};
use comport_core::{
  incident::{CitizenComplaint, OfficerInvolvedShooting, UseOfForceIncident},
  schema::IncidentKind,
  store::{ExtractorStore, IncidentStore},
};

pub use error::ApiError;
pub use identity::ExtractorIdentity;

/// Build the extractor-facing router for `store`.
///
/// | Method | Path          | Body                     |
/// |--------|---------------|--------------------------|
/// | `POST` | `/heartbeat`  | any JSON, echoed back    |
/// | `POST` | `/UOF`        | `{"data": [<payload>…]}` |
/// | `POST` | `/OIS`        | `{"data": [<payload>…]}` |
/// | `POST` | `/complaints` | `{"data": [<payload>…]}` |
pub fn data_router<S>(store: Arc<S>) -> Router<()>
where
  S: IncidentStore + ExtractorStore + 'static,
{
  Router::new()
    .route("/heartbeat", post(data::heartbeat::<S>))
    .route(&batch_path::<UseOfForceIncident>(), post(data::batch::<S, UseOfForceIncident>))
    .route(
      &batch_path::<OfficerInvolvedShooting>(),
      post(data::batch::<S, OfficerInvolvedShooting>),
    )
    .route(&batch_path::<CitizenComplaint>(), post(data::batch::<S, CitizenComplaint>))
    .with_state(store)
}

fn batch_path<R: IncidentKind>() -> String {
  format!("/{}", R::KIND.route_segment())
}
