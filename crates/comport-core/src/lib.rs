//! Core types and reconciliation logic for the comport ingestion service.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::IncidentStore`] and [`store::ExtractorStore`];
//! transport layers call into [`ingest`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod checkpoint;
pub mod coerce;
pub mod error;
pub mod extractor;
pub mod incident;
pub mod ingest;
pub mod reconcile;
pub mod schema;
pub mod store;

pub use error::{Error, Result};

/// Identifier of the department that owns an extractor and its incidents.
pub type DepartmentId = i64;
