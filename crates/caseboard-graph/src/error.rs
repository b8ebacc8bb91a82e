use caseboard_catalog::CatalogError;
use thiserror::Error;

use crate::engine::EngineError;

/// Errors from board client operations.
///
/// None of these are recoverable at the point raised; the client performs no
/// retries. Cleanup paths (closing transactions and sessions while
/// unwinding) swallow secondary errors so the original one is not masked.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Catalog load failed during client construction.
    #[error("failed to initialise operation catalog: {0}")]
    Catalog(#[source] CatalogError),

    /// A query could not be built from its template for a domain call.
    #[error("failed to build query for operation '{operation}': {source}")]
    Template {
        operation: String,
        #[source]
        source: CatalogError,
    },

    /// Transaction open, query, or commit failure, or a structural
    /// result-shape violation (zero or multiple documents where exactly one
    /// is expected).
    #[error("operation '{operation}' failed: {detail}")]
    Query { operation: String, detail: String },

    /// Active version missing when required.
    #[error("active version error: {0}")]
    ActiveVersion(String),

    /// A debug-gated operation was invoked without debug mode enabled.
    #[error("operation is not allowed: {0}")]
    NotAllowed(String),

    /// Engine failure outside any catalog operation (database management).
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
