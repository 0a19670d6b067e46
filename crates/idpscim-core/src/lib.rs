//! Reconciliation engine for syncing an identity provider directory into a
//! SCIM target.
//!
//! This crate holds the entity model, the content hashing that makes
//! comparisons cheap, the set-difference algorithms, the persisted state
//! model and the sync orchestrator. It is deliberately free of HTTP and
//! storage dependencies; those live behind the traits in [`service`].

// Traits use `impl Future + Send` returns; implementors write `async fn`.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod hash;
pub mod model;
pub mod operations;
pub mod reconcile;
pub mod service;
pub mod sync;

pub use error::{Error, Result};
pub use sync::{ChangeCounts, SyncOptions, SyncPhase, SyncReport, SyncService};
