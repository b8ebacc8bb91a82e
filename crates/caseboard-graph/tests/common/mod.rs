//! Shared test support: an in-memory mock engine that records every query,
//! plus an on-disk catalog fixture covering the full operation set.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use caseboard_core::{BoardConfig, EngineSettings};
use caseboard_graph::{Document, Engine, EngineError, EngineTransaction, TransactionKind};

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    begins: usize,
    commits: usize,
    closes: usize,
    session_closes: usize,
    responses: Vec<(String, Vec<Document>)>,
    fail_matching: Option<String>,
    fail_commit: bool,
}

/// Mock engine: queries matching a registered key return canned documents;
/// everything is recorded for assertions. Clone shares the same state.
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any query containing `key` returns `docs`.
    pub fn respond(&self, key: &str, docs: Vec<Document>) {
        self.state
            .lock()
            .unwrap()
            .responses
            .push((key.to_string(), docs));
    }

    /// Any query containing `key` fails.
    pub fn fail_matching(&self, key: &str) {
        self.state.lock().unwrap().fail_matching = Some(key.to_string());
    }

    pub fn fail_commit(&self) {
        self.state.lock().unwrap().fail_commit = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of executed queries whose text contains `pattern`.
    pub fn call_count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn begins(&self) -> usize {
        self.state.lock().unwrap().begins
    }

    pub fn commits(&self) -> usize {
        self.state.lock().unwrap().commits
    }

    pub fn session_closes(&self) -> usize {
        self.state.lock().unwrap().session_closes
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn database_exists(&self, name: &str) -> Result<bool, EngineError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("DB-EXISTS {name}"));
        Ok(false)
    }

    async fn database_create(&self, name: &str) -> Result<(), EngineError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("DB-CREATE {name}"));
        Ok(())
    }

    async fn database_delete(&self, name: &str) -> Result<(), EngineError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(format!("DB-DELETE {name}"));
        Ok(())
    }

    async fn list_databases(&self) -> Result<Vec<String>, EngineError> {
        Ok(Vec::new())
    }

    async fn begin(
        &self,
        _kind: TransactionKind,
    ) -> Result<Box<dyn EngineTransaction>, EngineError> {
        self.state.lock().unwrap().begins += 1;
        Ok(Box::new(MockTransaction {
            state: self.state.clone(),
        }))
    }

    async fn close(&self) {
        self.state.lock().unwrap().session_closes += 1;
    }
}

struct MockTransaction {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl EngineTransaction for MockTransaction {
    async fn query(&mut self, text: &str) -> Result<Vec<Document>, EngineError> {
        let mut state = self.state.lock().unwrap();

        if let Some(pattern) = state.fail_matching.clone() {
            if text.contains(&pattern) {
                return Err(EngineError::Query(format!(
                    "injected failure for '{pattern}'"
                )));
            }
        }

        state.calls.push(text.to_string());

        Ok(state
            .responses
            .iter()
            .find(|(key, _)| text.contains(key.as_str()))
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default())
    }

    async fn commit(&mut self) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commit {
            return Err(EngineError::Commit("injected commit failure".to_string()));
        }
        state.commits += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

// ── Catalog fixture ──────────────────────────────────────────────

const OPERATIONS: &[(&str, &[&str], &str)] = &[
    (
        "get-active-version",
        &["investigation_name"],
        "GET-ACTIVE-VERSION {investigation_name}",
    ),
    (
        "set-active-version",
        &["investigation_name", "version"],
        "SET-ACTIVE-VERSION {investigation_name} {version}",
    ),
    (
        "get-versions",
        &["investigation_name"],
        "GET-VERSIONS {investigation_name}",
    ),
    (
        "graph-by-version-get",
        &["investigation_name", "version"],
        "GRAPH-BY-VERSION-GET {investigation_name} {version}",
    ),
    (
        "graph-by-version-create",
        &["investigation_name", "version"],
        "GRAPH-BY-VERSION-CREATE {investigation_name} {version}",
    ),
    (
        "graph-by-version-delete",
        &["investigation_name", "version"],
        "GRAPH-BY-VERSION-DELETE {investigation_name} {version}",
    ),
    (
        "node-create",
        &[
            "investigation_name",
            "version",
            "node_id",
            "name",
            "pos_x",
            "pos_y",
            "picture_path",
            "description",
        ],
        "NODE-CREATE {investigation_name} {version} id={node_id} {name} {pos_x} {pos_y} {picture_path} {description}",
    ),
    (
        "node-update",
        &[
            "investigation_name",
            "version",
            "node_id",
            "name",
            "pos_x",
            "pos_y",
            "picture_path",
            "description",
        ],
        "NODE-UPDATE {investigation_name} {version} id={node_id} {name} {pos_x} {pos_y} {picture_path} {description}",
    ),
    (
        "node-delete",
        &["investigation_name", "version", "node_id"],
        "NODE-DELETE {investigation_name} {version} id={node_id}",
    ),
    (
        "edge-create",
        &[
            "investigation_name",
            "version",
            "edge_id",
            "node1_id",
            "node2_id",
            "description",
        ],
        "EDGE-CREATE {investigation_name} {version} id={edge_id} {node1_id} {node2_id} {description}",
    ),
    (
        "edge-update",
        &["investigation_name", "version", "edge_id", "description"],
        "EDGE-UPDATE {investigation_name} {version} id={edge_id} {description}",
    ),
    (
        "edge-delete",
        &["investigation_name", "version", "edge_id"],
        "EDGE-DELETE {investigation_name} {version} id={edge_id}",
    ),
    (
        "investigation-create",
        &["investigation_name"],
        "INVESTIGATION-CREATE {investigation_name}",
    ),
    (
        "investigation-delete",
        &["investigation_name"],
        "INVESTIGATION-DELETE {investigation_name}",
    ),
];

/// Write a complete catalog under `<tempdir>/v0.1` with tagged templates
/// that make recorded queries easy to match on.
pub fn test_catalog_root() -> TempDir {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("v0.1");
    fs::create_dir_all(&dir).unwrap();

    let entries: Vec<serde_json::Value> = OPERATIONS
        .iter()
        .map(|(operation, params, _)| {
            serde_json::json!({
                "operation": operation,
                "file": format!("{operation}.cql"),
                "description": null,
                "params": params,
                "output": null
            })
        })
        .collect();
    fs::write(
        dir.join("specification.json"),
        serde_json::to_string_pretty(&serde_json::Value::Array(entries)).unwrap(),
    )
    .unwrap();

    for (operation, _, template) in OPERATIONS {
        fs::write(dir.join(format!("{operation}.cql")), template).unwrap();
    }

    fs::write(
        dir.join("schema"),
        "SCHEMA-STATEMENT-ONE;\nSCHEMA-STATEMENT-TWO\n",
    )
    .unwrap();

    root
}

pub fn test_config(catalog_root: &Path, debug_ops: bool) -> BoardConfig {
    BoardConfig {
        engine: EngineSettings::default(),
        catalog_root: catalog_root.display().to_string(),
        schema_version: "v0.1".to_string(),
        investigation: "case-x".to_string(),
        debug_ops,
    }
}
