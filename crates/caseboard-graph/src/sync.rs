//! Graph diff synchronization.
//!
//! Converges the persisted state of one board version to a caller-supplied
//! desired state through minimal create/update/delete calls on the board
//! client. Each reconciliation step runs in its own transaction; there is no
//! rollback, so a failure partway through leaves a partially converged graph
//! — the error reports exactly which steps had already been applied.
//!
//! Processing order: node deletes, node creates, node updates, edge deletes,
//! edge creates, edge updates. A node delete detaches edges that reference
//! the node (the `node-delete` template owns that cascade), so deleting a
//! node whose edges are also being deleted in the same run cannot strand an
//! edge.

use std::collections::HashMap;

use caseboard_core::{BoardEdge, BoardNode};

use crate::client::BoardClient;
use crate::error::ClientError;

/// One reconciliation call, identified by the entity id it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    NodeDelete(String),
    NodeCreate(String),
    NodeUpdate(String),
    EdgeDelete(String),
    EdgeCreate(String),
    EdgeUpdate(String),
}

/// Steps a completed sync applied, in execution order. Empty when the
/// desired state already matched the persisted state.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub steps: Vec<SyncStep>,
}

impl SyncReport {
    /// True when the run issued zero write calls.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A sync that stopped partway. `applied` lists the steps that already
/// succeeded and persist in the store.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to fetch current graph for version '{version}': {source}")]
    Fetch {
        version: String,
        #[source]
        source: ClientError,
    },

    #[error("sync stopped at {step:?} after {} applied step(s): {source}", applied.len())]
    Step {
        applied: Vec<SyncStep>,
        step: SyncStep,
        #[source]
        source: ClientError,
    },
}

impl BoardClient {
    /// Reconcile the persisted graph of `version` with the desired
    /// `nodes`/`edges`. Emits calls only for entities that actually differ;
    /// a no-diff run performs zero writes.
    pub async fn update_graph(
        &self,
        version: &str,
        nodes: &[BoardNode],
        edges: &[BoardEdge],
    ) -> Result<SyncReport, SyncError> {
        let current = self
            .graph_by_version_get(Some(version))
            .await
            .map_err(|source| SyncError::Fetch {
                version: version.to_string(),
                source,
            })?;

        let current_nodes: HashMap<&str, &BoardNode> = current
            .nodes
            .iter()
            .map(|n| (n.node_id.as_str(), n))
            .collect();
        let desired_nodes: HashMap<&str, &BoardNode> =
            nodes.iter().map(|n| (n.node_id.as_str(), n)).collect();

        let current_edges: HashMap<&str, &BoardEdge> = current
            .edges
            .iter()
            .map(|e| (e.edge_id.as_str(), e))
            .collect();
        let desired_edges: HashMap<&str, &BoardEdge> =
            edges.iter().map(|e| (e.edge_id.as_str(), e)).collect();

        let mut applied: Vec<SyncStep> = Vec::new();

        macro_rules! apply {
            ($step:expr, $call:expr) => {{
                let step = $step;
                if let Err(source) = $call.await {
                    return Err(SyncError::Step {
                        applied,
                        step,
                        source,
                    });
                }
                applied.push(step);
            }};
        }

        // Node deletes: persisted but no longer desired.
        for node in &current.nodes {
            if !desired_nodes.contains_key(node.node_id.as_str()) {
                apply!(
                    SyncStep::NodeDelete(node.node_id.clone()),
                    self.node_delete(&node.node_id, Some(version))
                );
            }
        }

        // Node creates: desired but not persisted.
        for node in nodes {
            if !current_nodes.contains_key(node.node_id.as_str()) {
                apply!(
                    SyncStep::NodeCreate(node.node_id.clone()),
                    self.node_create(node, Some(version))
                );
            }
        }

        // Node updates: present in both, any field differing by value.
        for node in &current.nodes {
            let Some(desired) = desired_nodes.get(node.node_id.as_str()) else {
                continue;
            };
            if node_differs(node, desired) {
                apply!(
                    SyncStep::NodeUpdate(node.node_id.clone()),
                    self.node_update(desired, Some(version))
                );
            }
        }

        // Edge deletes.
        for edge in &current.edges {
            if !desired_edges.contains_key(edge.edge_id.as_str()) {
                apply!(
                    SyncStep::EdgeDelete(edge.edge_id.clone()),
                    self.edge_delete(&edge.edge_id, Some(version))
                );
            }
        }

        // Edge creates.
        for edge in edges {
            if !current_edges.contains_key(edge.edge_id.as_str()) {
                apply!(
                    SyncStep::EdgeCreate(edge.edge_id.clone()),
                    self.edge_create(edge, Some(version))
                );
            }
        }

        // Edge updates. An endpoint change is topological: the store cannot
        // repoint an edge in place, so it is recreated under the same id.
        for edge in &current.edges {
            let Some(desired) = desired_edges.get(edge.edge_id.as_str()) else {
                continue;
            };

            let endpoints_changed = edge.node1 != desired.node1 || edge.node2 != desired.node2;
            let description_changed = edge.description != desired.description;

            if endpoints_changed {
                apply!(
                    SyncStep::EdgeDelete(edge.edge_id.clone()),
                    self.edge_delete(&edge.edge_id, Some(version))
                );
                apply!(
                    SyncStep::EdgeCreate(edge.edge_id.clone()),
                    self.edge_create(desired, Some(version))
                );
            } else if description_changed {
                apply!(
                    SyncStep::EdgeUpdate(edge.edge_id.clone()),
                    self.edge_update(&edge.edge_id, desired.description.as_deref(), Some(version))
                );
            }
        }

        tracing::debug!(version, steps = applied.len(), "graph sync complete");
        Ok(SyncReport { steps: applied })
    }
}

/// Field-wise value comparison; positions compare as floats.
fn node_differs(current: &BoardNode, desired: &BoardNode) -> bool {
    current.name != desired.name
        || current.pos_x != desired.pos_x
        || current.pos_y != desired.pos_y
        || current.picture_path != desired.picture_path
        || current.description != desired.description
}
