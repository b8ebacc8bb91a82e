//! The transactional board client.
//!
//! Translates domain operations (node/edge CRUD, version CRUD, active
//! version get/set, investigation create/delete) into catalog operations
//! executed inside scoped transactions. Every call follows the same shape:
//! resolve the version, render the query, open one transaction, execute,
//! commit (writes) or materialize documents (reads), close unconditionally.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use caseboard_catalog::{params, CatalogError, OperationCatalog, Params};
use caseboard_core::{BoardConfig, BoardEdge, BoardGraph, BoardNode, VersionInfo, VersionList};

use crate::engine::{Document, Engine, EngineError, TransactionKind};
use crate::error::ClientError;

const SPEC_FILE_NAME: &str = "specification.json";
const SCHEMA_FILE_NAME: &str = "schema";

/// Client for one investigation board database.
///
/// Holds the engine session, the loaded operation catalog, and the cached
/// active version. Call [`BoardClient::load_active_version`] right after
/// construction; until then every version-omitting call fails with
/// [`ClientError::ActiveVersion`].
pub struct BoardClient {
    engine: Arc<dyn Engine>,
    catalog: OperationCatalog,
    db_name: String,
    investigation: String,
    debug_ops: bool,
    schema_dir: PathBuf,
    active_version: Option<String>,
}

impl BoardClient {
    /// Build a client over an already-connected engine session.
    ///
    /// Loads the operation catalog for the configured schema version. On
    /// catalog failure the engine session is closed before the error is
    /// returned, so construction never leaks a session.
    pub async fn new(engine: Arc<dyn Engine>, config: &BoardConfig) -> Result<Self, ClientError> {
        let catalog = match OperationCatalog::load(
            &config.catalog_root,
            &config.schema_version,
            SPEC_FILE_NAME,
        ) {
            Ok(catalog) => catalog,
            Err(e) => {
                engine.close().await;
                return Err(ClientError::Catalog(e));
            }
        };

        let schema_dir = catalog.base_dir().to_path_buf();

        Ok(Self {
            engine,
            catalog,
            db_name: config.engine.db_name.clone(),
            investigation: config.investigation.clone(),
            debug_ops: config.debug_ops,
            schema_dir,
            active_version: None,
        })
    }

    /// The loaded operation catalog.
    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    /// Investigation this client serves.
    pub fn investigation(&self) -> &str {
        &self.investigation
    }

    // ── Version resolution ───────────────────────────────────────

    /// Fetch the investigation's active version from the store and cache it.
    ///
    /// An absent or empty-string `active_version` both count as unset and
    /// fail with [`ClientError::ActiveVersion`]; an empty version could
    /// never name a board version.
    pub async fn load_active_version(&mut self) -> Result<(), ClientError> {
        let op = "get-active-version";
        let query = self.build_query(
            op,
            params! { investigation_name = self.investigation.as_str() },
        )?;
        let docs = self.execute_read(op, &query).await?;

        let value = docs.iter().find_map(|doc| doc.get("active_version"));
        let version = match value {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(ClientError::ActiveVersion(format!(
                    "operation '{op}' did not return 'active_version' for investigation '{}'",
                    self.investigation
                )));
            }
        };

        tracing::debug!(version = %version, "active version loaded");
        self.active_version = Some(version);
        Ok(())
    }

    /// The cached active version, if any.
    pub fn active_version(&self) -> Option<&str> {
        self.active_version.as_deref()
    }

    /// Return `explicit` when given, otherwise the cached active version.
    pub fn resolve_version(&self, explicit: Option<&str>) -> Result<String, ClientError> {
        match explicit {
            Some(v) => Ok(v.to_string()),
            None => self.active_version.clone().ok_or_else(|| {
                ClientError::ActiveVersion(
                    "active version is not set and no explicit version was provided".to_string(),
                )
            }),
        }
    }

    /// Set the investigation's active version. The in-memory cache is
    /// updated only after the write succeeds, so cache and store never
    /// disagree after a successful call.
    pub async fn set_active_version(&mut self, version: &str) -> Result<(), ClientError> {
        let op = "set-active-version";
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version,
            },
        )?;
        self.execute_write(op, &query).await?;

        tracing::info!(version, "active version set");
        self.active_version = Some(version.to_string());
        Ok(())
    }

    // ── Node operations ──────────────────────────────────────────

    /// Create a node within the given board version (active version when
    /// `version` is `None`).
    pub async fn node_create(
        &self,
        node: &BoardNode,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        self.node_write("node-create", node, version).await
    }

    /// Update all mutable properties of a node.
    pub async fn node_update(
        &self,
        node: &BoardNode,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        self.node_write("node-update", node, version).await
    }

    async fn node_write(
        &self,
        op: &str,
        node: &BoardNode,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
                node_id = node.node_id.as_str(),
                name = node.name.as_str(),
                pos_x = node.pos_x,
                pos_y = node.pos_y,
                picture_path = node.picture_path.clone().unwrap_or_default(),
                description = node.description.clone().unwrap_or_default(),
            },
        )?;
        self.execute_write(op, &query).await
    }

    /// Delete a node and its association with the board version. Edges
    /// referencing the node are detached by the template (see the catalog's
    /// `node-delete` query).
    pub async fn node_delete(
        &self,
        node_id: &str,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        let op = "node-delete";
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
                node_id = node_id,
            },
        )?;
        self.execute_write(op, &query).await
    }

    // ── Edge operations ──────────────────────────────────────────

    /// Create an edge between two nodes within the board version. Endpoint
    /// existence is not checked here.
    pub async fn edge_create(
        &self,
        edge: &BoardEdge,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        let op = "edge-create";
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
                edge_id = edge.edge_id.as_str(),
                node1_id = edge.node1.as_str(),
                node2_id = edge.node2.as_str(),
                description = edge.description.clone().unwrap_or_default(),
            },
        )?;
        self.execute_write(op, &query).await
    }

    /// Update the description of an edge. Endpoints cannot be updated in
    /// place; delete and recreate instead.
    pub async fn edge_update(
        &self,
        edge_id: &str,
        description: Option<&str>,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        let op = "edge-update";
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
                edge_id = edge_id,
                description = description.unwrap_or_default(),
            },
        )?;
        self.execute_write(op, &query).await
    }

    /// Delete an edge from the board version.
    pub async fn edge_delete(
        &self,
        edge_id: &str,
        version: Option<&str>,
    ) -> Result<(), ClientError> {
        let op = "edge-delete";
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
                edge_id = edge_id,
            },
        )?;
        self.execute_write(op, &query).await
    }

    // ── Board version operations ─────────────────────────────────

    /// Fetch all nodes and edges of a board version. The store aggregates a
    /// version's full graph into a single document; zero or multiple
    /// documents is a structural error.
    pub async fn graph_by_version_get(
        &self,
        version: Option<&str>,
    ) -> Result<BoardGraph, ClientError> {
        let op = "graph-by-version-get";
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
            },
        )?;

        let doc = self.expect_one(op, self.execute_read(op, &query).await?)?;
        serde_json::from_value(doc).map_err(|e| self.shape_err(op, format!("malformed graph document: {e}")))
    }

    /// Create a new, empty board version. The version must be explicit; a
    /// new version can never default to the active one.
    pub async fn graph_by_version_create(&self, version: &str) -> Result<(), ClientError> {
        let op = "graph-by-version-create";
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version,
            },
        )?;
        self.execute_write(op, &query).await
    }

    /// Delete all nodes and edges of a board version, then the version
    /// itself.
    pub async fn graph_by_version_delete(&self, version: Option<&str>) -> Result<(), ClientError> {
        let op = "graph-by-version-delete";
        let version = self.resolve_version(version)?;
        let query = self.build_query(
            op,
            params! {
                investigation_name = self.investigation.as_str(),
                version = version.as_str(),
            },
        )?;
        self.execute_write(op, &query).await
    }

    /// List all versions of the investigation.
    pub async fn get_versions(&self) -> Result<Vec<VersionInfo>, ClientError> {
        let op = "get-versions";
        let query = self.build_query(
            op,
            params! { investigation_name = self.investigation.as_str() },
        )?;

        let doc = self.expect_one(op, self.execute_read(op, &query).await?)?;
        let list: VersionList = serde_json::from_value(doc)
            .map_err(|e| self.shape_err(op, format!("malformed versions document: {e}")))?;
        Ok(list.versions)
    }

    // ── Debug-gated operations ───────────────────────────────────

    /// Create the configured database (or `name`) if absent. Debug only.
    pub async fn create_database(&self, name: Option<&str>) -> Result<(), ClientError> {
        self.ensure_debug_allowed()?;
        let name = name.unwrap_or(&self.db_name);
        if !self.engine.database_exists(name).await? {
            self.engine.database_create(name).await?;
        }
        Ok(())
    }

    /// Drop the configured database (or `name`) if present. Debug only.
    pub async fn drop_database(&self, name: Option<&str>) -> Result<(), ClientError> {
        self.ensure_debug_allowed()?;
        let name = name.unwrap_or(&self.db_name);
        if self.engine.database_exists(name).await? {
            self.engine.database_delete(name).await?;
        }
        Ok(())
    }

    /// Create the investigation and apply the full schema definition. Debug
    /// only.
    ///
    /// The schema file lives under the schema-version directory and is
    /// applied statement by statement inside one schema transaction before
    /// the catalog's `investigation-create` operation runs. A schema failure
    /// is fatal to the call; the catalog operation is not attempted.
    pub async fn investigation_create(&self) -> Result<(), ClientError> {
        self.ensure_debug_allowed()?;
        let op = "investigation-create";

        let schema_path = self.schema_dir.join(SCHEMA_FILE_NAME);
        let schema_text = fs::read_to_string(&schema_path).map_err(|e| ClientError::Query {
            operation: op.to_string(),
            detail: format!("failed to read schema file '{}': {e}", schema_path.display()),
        })?;

        let statements: Vec<&str> = schema_text
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        self.execute_statements(op, TransactionKind::Schema, &statements)
            .await?;

        let query = self.build_query(
            op,
            params! { investigation_name = self.investigation.as_str() },
        )?;
        self.execute_write(op, &query).await
    }

    /// Delete the entire investigation with all its versions. Debug only.
    pub async fn investigation_delete(&self) -> Result<(), ClientError> {
        self.ensure_debug_allowed()?;
        let op = "investigation-delete";
        let query = self.build_query(
            op,
            params! { investigation_name = self.investigation.as_str() },
        )?;
        self.execute_write(op, &query).await
    }

    fn ensure_debug_allowed(&self) -> Result<(), ClientError> {
        if self.debug_ops {
            Ok(())
        } else {
            Err(ClientError::NotAllowed(
                "this operation requires debug_ops to be enabled in the client configuration"
                    .to_string(),
            ))
        }
    }

    // ── Database management (ungated) ────────────────────────────

    /// Create the configured database if it does not exist yet. Used at
    /// deployment setup; not debug-gated because it is non-destructive.
    pub async fn ensure_database_exists(&self) -> Result<(), ClientError> {
        if !self.engine.database_exists(&self.db_name).await? {
            self.engine.database_create(&self.db_name).await?;
        }
        Ok(())
    }

    /// Names of all databases on the engine.
    pub async fn list_databases(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.engine.list_databases().await?)
    }

    // ── Shared helpers ───────────────────────────────────────────

    fn build_query(&self, op: &str, params: Params) -> Result<String, ClientError> {
        self.catalog
            .render(op, &params)
            .map_err(|source| self.template_err(op, source))
    }

    fn template_err(&self, op: &str, source: CatalogError) -> ClientError {
        ClientError::Template {
            operation: op.to_string(),
            source,
        }
    }

    fn query_err(&self, op: &str, e: EngineError) -> ClientError {
        ClientError::Query {
            operation: op.to_string(),
            detail: format!("on database '{}': {e}", self.db_name),
        }
    }

    fn shape_err(&self, op: &str, detail: String) -> ClientError {
        ClientError::Query {
            operation: op.to_string(),
            detail,
        }
    }

    fn expect_one(&self, op: &str, mut docs: Vec<Document>) -> Result<Document, ClientError> {
        match docs.len() {
            1 => Ok(docs.remove(0)),
            0 => Err(self.shape_err(op, "returned no documents".to_string())),
            n => Err(self.shape_err(
                op,
                format!("returned {n} documents, but expected exactly one"),
            )),
        }
    }

    async fn execute_write(&self, op: &str, query: &str) -> Result<(), ClientError> {
        self.execute_statements(op, TransactionKind::Write, &[query])
            .await
    }

    /// Run statements in one write/schema transaction; commit on success,
    /// close on every path.
    async fn execute_statements(
        &self,
        op: &str,
        kind: TransactionKind,
        statements: &[&str],
    ) -> Result<(), ClientError> {
        let mut tx = self
            .engine
            .begin(kind)
            .await
            .map_err(|e| self.query_err(op, e))?;

        for statement in statements {
            if let Err(e) = tx.query(statement).await {
                let _ = tx.close().await;
                return Err(self.query_err(op, e));
            }
        }

        if let Err(e) = tx.commit().await {
            let _ = tx.close().await;
            return Err(self.query_err(op, e));
        }
        let _ = tx.close().await;
        Ok(())
    }

    /// Run one read query; documents are materialized by the engine before
    /// the transaction is closed.
    async fn execute_read(&self, op: &str, query: &str) -> Result<Vec<Document>, ClientError> {
        let mut tx = self
            .engine
            .begin(TransactionKind::Read)
            .await
            .map_err(|e| self.query_err(op, e))?;

        let docs = match tx.query(query).await {
            Ok(docs) => docs,
            Err(e) => {
                let _ = tx.close().await;
                return Err(self.query_err(op, e));
            }
        };
        let _ = tx.close().await;
        Ok(docs)
    }
}
