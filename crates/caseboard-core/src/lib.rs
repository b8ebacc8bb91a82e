//! caseboard-core: Shared types and configuration for the caseboard platform.
//!
//! This crate provides the foundational pieces used across all caseboard
//! components:
//! - Board entity types (nodes, edges, versions) for the investigation graph
//! - Configuration management
//!
//! Caseboard models an investigation board as a versioned graph: each board
//! version owns a set of nodes and edges, and one version per investigation
//! is marked active.

pub mod config;
pub mod types;

pub use config::{BoardConfig, EngineSettings};
pub use types::{BoardEdge, BoardGraph, BoardNode, VersionInfo, VersionList};
