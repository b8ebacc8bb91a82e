//! caseboard-graph: transactional client for the versioned investigation
//! board graph.
//!
//! This crate is the single mutation point for the board store. Every domain
//! operation renders a query from the operation catalog, runs it inside one
//! scoped transaction against the engine, and maps failures into the client
//! error taxonomy. The diff synchronizer converges a persisted board version
//! to a caller-supplied desired state through minimal create/update/delete
//! calls on the same client.
//!
//! A `BoardClient` instance is not a shared multi-thread resource: the
//! cached active version is plain mutable state with no concurrency guard.
//! Use one client per task, or put your own synchronization around it.

pub mod client;
pub mod engine;
pub mod error;
pub mod sync;

pub use client::BoardClient;
pub use engine::{Document, Engine, EngineError, EngineTransaction, Neo4jEngine, TransactionKind};
pub use error::ClientError;
pub use sync::{SyncError, SyncReport, SyncStep};
