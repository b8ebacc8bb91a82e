//! caseboard-catalog: declarative query catalog for the caseboard graph client.
//!
//! A catalog is a versioned directory of named query templates plus a
//! `specification.json` declaring, per operation, the template file and the
//! exact parameter set it requires. The loader validates the whole catalog
//! up front; the renderer substitutes `{name}` placeholders under strict
//! arity checking (no missing parameters, no extras).
//!
//! Parameter values are embedded into the query text verbatim — the catalog
//! performs no escaping or quoting. Template authors own that boundary.

pub mod catalog;
pub mod error;
pub mod params;

pub use catalog::{OperationCatalog, OperationInfo, OperationSpec};
pub use error::CatalogError;
pub use params::{ParamValue, Params};
