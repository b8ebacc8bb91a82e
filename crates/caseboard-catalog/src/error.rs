use thiserror::Error;

/// Errors from catalog loading and query rendering.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The specification file or its contents are missing or malformed.
    /// Fatal to catalog load.
    #[error("Specification error: {0}")]
    Specification(String),

    /// A template file listed in the specification is missing or unreadable.
    /// Fatal to catalog load.
    #[error("Template file error: {0}")]
    TemplateFile(String),

    /// A problem with a specific operation: unknown name, missing or extra
    /// parameters, or a substitution failure while rendering.
    #[error("Operation error: {0}")]
    Operation(String),
}
