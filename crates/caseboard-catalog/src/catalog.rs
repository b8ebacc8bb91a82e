//! Catalog loading and template rendering.
//!
//! Directory layout example:
//!
//! ```text
//! db/
//!   v0.1/
//!     specification.json
//!     node-create.cql
//!     node-update.cql
//!     node-delete.cql
//!     ...
//! ```
//!
//! `specification.json` is a JSON array of objects:
//!
//! ```json
//! [
//!   {
//!     "operation": "node-create",
//!     "file": "node-create.cql",
//!     "description": "Creates a node within the specified board version.",
//!     "params": ["investigation_name", "version", "node_id", "name",
//!                "pos_x", "pos_y", "picture_path", "description"],
//!     "output": null
//!   }
//! ]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CatalogError;
use crate::params::Params;

/// One loaded catalog operation. Immutable after load.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    /// Template filename, relative to the schema-version directory.
    pub file: String,
    /// Required parameter names. Exactly these must be provided at render.
    pub params: BTreeSet<String>,
    pub description: Option<String>,
    /// Optional hint describing the shape of the read result.
    pub output: Option<Value>,
    /// Template text, read once at load.
    pub template: String,
}

/// Operation metadata returned by [`OperationCatalog::describe`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OperationInfo {
    pub operation: String,
    pub file: String,
    pub description: Option<String>,
    /// Sorted for stable output.
    pub params: Vec<String>,
    pub output: Option<Value>,
}

/// A loaded, validated catalog of query templates for one schema version.
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    version: String,
    base_dir: PathBuf,
    operations: BTreeMap<String, OperationSpec>,
}

impl OperationCatalog {
    /// Load and validate the catalog at `{catalog_root}/{version}`.
    ///
    /// Fails with [`CatalogError::Specification`] on a missing version
    /// directory, a missing or malformed spec file, an invalid entry, or a
    /// duplicate operation name; with [`CatalogError::TemplateFile`] when a
    /// listed template file is missing or unreadable.
    pub fn load(
        catalog_root: impl AsRef<Path>,
        version: &str,
        spec_file_name: &str,
    ) -> Result<Self, CatalogError> {
        let base_dir = catalog_root.as_ref().join(version);

        if !base_dir.is_dir() {
            return Err(CatalogError::Specification(format!(
                "catalog version directory \"{}\" does not exist or is not a directory",
                base_dir.display()
            )));
        }

        let spec_path = base_dir.join(spec_file_name);
        if !spec_path.is_file() {
            return Err(CatalogError::Specification(format!(
                "specification file \"{}\" does not exist or is not a file",
                spec_path.display()
            )));
        }

        let spec_text = fs::read_to_string(&spec_path).map_err(|e| {
            CatalogError::Specification(format!(
                "failed to read specification file \"{}\": {e}",
                spec_path.display()
            ))
        })?;

        let spec_data: Value = serde_json::from_str(&spec_text).map_err(|e| {
            CatalogError::Specification(format!(
                "failed to parse specification file \"{}\": {e}",
                spec_path.display()
            ))
        })?;

        let entries = spec_data.as_array().ok_or_else(|| {
            CatalogError::Specification(format!(
                "specification file \"{}\" must contain a JSON array of operations",
                spec_path.display()
            ))
        })?;

        let mut operations = BTreeMap::new();
        for entry in entries {
            let (name, spec) = load_entry(&base_dir, entry)?;
            if operations.contains_key(&name) {
                return Err(CatalogError::Specification(format!(
                    "duplicate operation name in specification: '{name}'"
                )));
            }
            operations.insert(name, spec);
        }

        tracing::debug!(
            version,
            operations = operations.len(),
            "operation catalog loaded"
        );

        Ok(Self {
            version: version.to_string(),
            base_dir,
            operations,
        })
    }

    /// Whether the catalog defines `operation`.
    pub fn has_operation(&self, operation: &str) -> bool {
        self.operations.contains_key(operation)
    }

    /// Required parameter names for `operation`.
    pub fn required_params(&self, operation: &str) -> Result<&BTreeSet<String>, CatalogError> {
        self.get(operation).map(|op| &op.params)
    }

    /// Render a query for `operation` from exactly the declared parameters.
    pub fn render(&self, operation: &str, params: &Params) -> Result<String, CatalogError> {
        self.render_with(operation, params, &Params::new())
    }

    /// Render with a base mapping plus overrides. Where both name the same
    /// key the override wins wholesale (last-writer-wins, not a merge of
    /// partial values).
    pub fn render_with(
        &self,
        operation: &str,
        params: &Params,
        overrides: &Params,
    ) -> Result<String, CatalogError> {
        let op = self.get(operation)?;

        let mut merged = params.clone();
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }

        let provided: BTreeSet<&str> = merged.keys().map(String::as_str).collect();
        let required: BTreeSet<&str> = op.params.iter().map(String::as_str).collect();

        let missing: Vec<&str> = required.difference(&provided).copied().collect();
        if !missing.is_empty() {
            return Err(CatalogError::Operation(format!(
                "operation '{operation}' is missing required parameter(s): {}",
                missing.join(", ")
            )));
        }

        let extra: Vec<&str> = provided.difference(&required).copied().collect();
        if !extra.is_empty() {
            return Err(CatalogError::Operation(format!(
                "operation '{operation}' received unknown parameter(s): {}",
                extra.join(", ")
            )));
        }

        substitute(&op.template, &merged).map_err(|e| {
            CatalogError::Operation(format!(
                "failed to render template for operation '{operation}': {e}"
            ))
        })
    }

    /// Declared metadata for `operation`.
    pub fn describe(&self, operation: &str) -> Result<OperationInfo, CatalogError> {
        let op = self.get(operation)?;
        Ok(OperationInfo {
            operation: operation.to_string(),
            file: op.file.clone(),
            description: op.description.clone(),
            params: op.params.iter().cloned().collect(),
            output: op.output.clone(),
        })
    }

    /// Catalog schema version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Directory the templates were loaded from.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn get(&self, operation: &str) -> Result<&OperationSpec, CatalogError> {
        self.operations
            .get(operation)
            .ok_or_else(|| CatalogError::Operation(format!("unknown operation '{operation}'")))
    }
}

/// Validate one specification entry and load its template file.
fn load_entry(base_dir: &Path, entry: &Value) -> Result<(String, OperationSpec), CatalogError> {
    let obj = entry.as_object().ok_or_else(|| {
        CatalogError::Specification(format!(
            "each specification entry must be an object, got: {entry}"
        ))
    })?;

    let operation = match obj.get("operation").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            return Err(CatalogError::Specification(format!(
                "specification entry is missing a valid 'operation' field: {entry}"
            )));
        }
    };

    let file = match obj.get("file").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            return Err(CatalogError::Specification(format!(
                "specification entry for '{operation}' is missing a valid 'file' field"
            )));
        }
    };

    let params = obj
        .get("params")
        .and_then(Value::as_array)
        .and_then(|list| {
            list.iter()
                .map(|p| p.as_str().map(str::to_string))
                .collect::<Option<BTreeSet<String>>>()
        })
        .ok_or_else(|| {
            CatalogError::Specification(format!(
                "specification entry for '{operation}' has invalid 'params' field; \
                 it must be a list of strings"
            ))
        })?;

    let template_path = base_dir.join(&file);
    if !template_path.is_file() {
        return Err(CatalogError::TemplateFile(format!(
            "template file \"{}\" for operation \"{operation}\" does not exist",
            template_path.display()
        )));
    }

    let template = fs::read_to_string(&template_path).map_err(|e| {
        CatalogError::TemplateFile(format!(
            "failed to read template file \"{}\" for operation \"{operation}\": {e}",
            template_path.display()
        ))
    })?;

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let output = obj.get("output").filter(|v| !v.is_null()).cloned();

    Ok((
        operation,
        OperationSpec {
            file,
            params,
            description,
            output,
            template,
        },
    ))
}

/// Replace `{name}` placeholders with parameter values. `{{` and `}}`
/// escape to literal braces. Anything else between braces is malformed.
fn substitute(template: &str, params: &Params) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(format!("unclosed placeholder '{{{name}'"));
                }
                if name.is_empty()
                    || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
                {
                    return Err(format!("malformed placeholder '{{{name}}}'"));
                }
                match params.get(&name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => return Err(format!("missing parameter \"{name}\"")),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err("single '}' encountered in template".to_string());
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
