//! Engine abstraction over the external graph store, plus the Neo4j-backed
//! implementation.
//!
//! The client consumes the store as an opaque transactional engine: open a
//! transaction of some kind, submit query text, commit or close. Read
//! queries return fully materialized documents so no result outlives its
//! transaction.
//!
//! Contract for read templates: each result row carries one JSON document in
//! a column named `doc`. The Neo4j implementation decodes that column;
//! shipped templates build it with `apoc.convert.toJson`.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};

use caseboard_core::EngineSettings;

/// A document-like read result row.
pub type Document = serde_json::Value;

/// Transaction kinds the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Read,
    Write,
    /// Schema definition statements (constraints, indexes).
    Schema,
}

/// Errors from the engine layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("failed to open transaction: {0}")]
    Transaction(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("commit error: {0}")]
    Commit(String),
}

/// One scoped transaction. Guaranteed to be closed on every exit path by
/// the client; close after a successful commit is a no-op.
#[async_trait]
pub trait EngineTransaction: Send {
    /// Execute query text. Returns materialized documents for reads, an
    /// empty vec for writes.
    async fn query(&mut self, text: &str) -> Result<Vec<Document>, EngineError>;

    /// Commit the transaction. Meaningless for read transactions.
    async fn commit(&mut self) -> Result<(), EngineError>;

    /// Best-effort close; callers swallow the error during unwinding.
    async fn close(&mut self) -> Result<(), EngineError>;
}

/// The external graph-database engine, bound to one database at connect
/// time.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn database_exists(&self, name: &str) -> Result<bool, EngineError>;
    async fn database_create(&self, name: &str) -> Result<(), EngineError>;
    async fn database_delete(&self, name: &str) -> Result<(), EngineError>;
    async fn list_databases(&self) -> Result<Vec<String>, EngineError>;

    /// Open a transaction of the given kind.
    async fn begin(&self, kind: TransactionKind) -> Result<Box<dyn EngineTransaction>, EngineError>;

    /// Best-effort session close.
    async fn close(&self);
}

// ── Neo4j implementation ─────────────────────────────────────────

/// Neo4j-backed engine. Clone is cheap (inner connection pool is shared).
#[derive(Clone)]
pub struct Neo4jEngine {
    graph: Graph,
}

impl Neo4jEngine {
    /// Connect to Neo4j with the given settings.
    pub async fn connect(settings: &EngineSettings) -> Result<Self, EngineError> {
        let neo_config = ConfigBuilder::default()
            .uri(&settings.uri)
            .user(&settings.user)
            .password(&settings.password)
            .db(settings.db_name.as_str())
            .build()
            .map_err(|e| EngineError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| EngineError::Connection(e.to_string()))?;

        tracing::info!(uri = %settings.uri, db = %settings.db_name, "connected to Neo4j");
        Ok(Self { graph })
    }

    async fn run_admin(&self, text: &str) -> Result<(), EngineError> {
        self.graph
            .run(query(text))
            .await
            .map_err(|e| EngineError::Query(e.to_string()))
    }
}

#[async_trait]
impl Engine for Neo4jEngine {
    async fn database_exists(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.list_databases().await?.iter().any(|db| db == name))
    }

    // Database management requires multi-database support on the server
    // side; on single-database deployments these calls fail at runtime.
    async fn database_create(&self, name: &str) -> Result<(), EngineError> {
        self.run_admin(&format!("CREATE DATABASE {name} IF NOT EXISTS")).await
    }

    async fn database_delete(&self, name: &str) -> Result<(), EngineError> {
        self.run_admin(&format!("DROP DATABASE {name} IF EXISTS")).await
    }

    async fn list_databases(&self) -> Result<Vec<String>, EngineError> {
        let mut stream = self
            .graph
            .execute(query("SHOW DATABASES YIELD name RETURN name"))
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?;

        let mut names = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?
        {
            if let Ok(name) = row.get::<String>("name") {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn begin(&self, kind: TransactionKind) -> Result<Box<dyn EngineTransaction>, EngineError> {
        match kind {
            // Reads are single-query round trips; the driver scopes an
            // auto-commit read transaction internally.
            TransactionKind::Read => Ok(Box::new(Neo4jReadTransaction {
                graph: self.graph.clone(),
            })),
            TransactionKind::Write | TransactionKind::Schema => {
                let txn = self
                    .graph
                    .start_txn()
                    .await
                    .map_err(|e| EngineError::Transaction(e.to_string()))?;
                Ok(Box::new(Neo4jWriteTransaction { txn: Some(txn) }))
            }
        }
    }

    async fn close(&self) {
        // neo4rs pools connections internally; dropping the last Graph
        // handle tears the pool down.
    }
}

struct Neo4jReadTransaction {
    graph: Graph,
}

#[async_trait]
impl EngineTransaction for Neo4jReadTransaction {
    async fn query(&mut self, text: &str) -> Result<Vec<Document>, EngineError> {
        let mut stream = self
            .graph
            .execute(query(text))
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?;

        // Materialize every document before the stream is dropped.
        let mut docs = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?
        {
            let raw: String = row
                .get("doc")
                .map_err(|e| EngineError::Query(format!("missing 'doc' column in read result: {e}")))?;
            let doc: Document = serde_json::from_str(&raw)
                .map_err(|e| EngineError::Query(format!("malformed 'doc' column: {e}")))?;
            docs.push(doc);
        }
        Ok(docs)
    }

    async fn commit(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

struct Neo4jWriteTransaction {
    txn: Option<neo4rs::Txn>,
}

#[async_trait]
impl EngineTransaction for Neo4jWriteTransaction {
    async fn query(&mut self, text: &str) -> Result<Vec<Document>, EngineError> {
        let txn = self
            .txn
            .as_mut()
            .ok_or_else(|| EngineError::Query("transaction already finished".to_string()))?;
        txn.run(query(text))
            .await
            .map_err(|e| EngineError::Query(e.to_string()))?;
        Ok(Vec::new())
    }

    async fn commit(&mut self) -> Result<(), EngineError> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| EngineError::Commit("transaction already finished".to_string()))?;
        txn.commit()
            .await
            .map_err(|e| EngineError::Commit(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if let Some(txn) = self.txn.take() {
            txn.rollback()
                .await
                .map_err(|e| EngineError::Transaction(e.to_string()))?;
        }
        Ok(())
    }
}
