//! Board client behavior against the mock engine: version resolution,
//! result-shape checking, transaction discipline, and the debug gate.

mod common;

use std::sync::Arc;

use serde_json::json;

use caseboard_core::BoardNode;
use caseboard_graph::{BoardClient, ClientError};

use common::{test_catalog_root, test_config, MockEngine};

async fn client_with(engine: &MockEngine, debug_ops: bool) -> (BoardClient, tempfile::TempDir) {
    let root = test_catalog_root();
    let config = test_config(root.path(), debug_ops);
    let client = BoardClient::new(Arc::new(engine.clone()), &config)
        .await
        .unwrap();
    (client, root)
}

fn sample_node(id: &str) -> BoardNode {
    BoardNode {
        node_id: id.to_string(),
        name: "suspect".to_string(),
        pos_x: 10.5,
        pos_y: -3.0,
        picture_path: Some("img/suspect.png".to_string()),
        description: None,
    }
}

#[tokio::test]
async fn test_construction_failure_closes_engine_session() {
    let engine = MockEngine::new();
    let root = tempfile::TempDir::new().unwrap();
    // No v0.1 directory: catalog load must fail.
    let config = test_config(root.path(), false);

    let err = BoardClient::new(Arc::new(engine.clone()), &config)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::Catalog(_)));
    assert_eq!(engine.session_closes(), 1);
}

#[tokio::test]
async fn test_resolve_version_requires_loaded_active_version() {
    let engine = MockEngine::new();
    let (client, _root) = client_with(&engine, false).await;

    let err = client.resolve_version(None).unwrap_err();
    assert!(matches!(err, ClientError::ActiveVersion(_)));

    // Explicit versions never touch the cache.
    assert_eq!(client.resolve_version(Some("v9")).unwrap(), "v9");
}

#[tokio::test]
async fn test_load_active_version_caches_value() {
    let engine = MockEngine::new();
    engine.respond("GET-ACTIVE-VERSION", vec![json!({"active_version": "v1"})]);
    let (mut client, _root) = client_with(&engine, false).await;

    client.load_active_version().await.unwrap();
    assert_eq!(client.active_version(), Some("v1"));
    assert_eq!(client.resolve_version(None).unwrap(), "v1");
}

#[tokio::test]
async fn test_load_active_version_missing_field_fails() {
    let engine = MockEngine::new();
    engine.respond("GET-ACTIVE-VERSION", vec![json!({"something_else": 1})]);
    let (mut client, _root) = client_with(&engine, false).await;

    let err = client.load_active_version().await.unwrap_err();
    assert!(matches!(err, ClientError::ActiveVersion(_)));
    assert_eq!(client.active_version(), None);
}

#[tokio::test]
async fn test_load_active_version_empty_string_counts_as_unset() {
    let engine = MockEngine::new();
    engine.respond("GET-ACTIVE-VERSION", vec![json!({"active_version": ""})]);
    let (mut client, _root) = client_with(&engine, false).await;

    let err = client.load_active_version().await.unwrap_err();
    assert!(matches!(err, ClientError::ActiveVersion(_)));
    assert_eq!(client.active_version(), None);
}

#[tokio::test]
async fn test_set_active_version_updates_cache_on_success() {
    let engine = MockEngine::new();
    let (mut client, _root) = client_with(&engine, false).await;

    client.set_active_version("v2").await.unwrap();
    assert_eq!(client.active_version(), Some("v2"));
    assert_eq!(client.resolve_version(None).unwrap(), "v2");
    assert_eq!(engine.call_count("SET-ACTIVE-VERSION case-x v2"), 1);
    assert_eq!(engine.commits(), 1);
}

#[tokio::test]
async fn test_set_active_version_failure_leaves_cache_untouched() {
    let engine = MockEngine::new();
    engine.respond("GET-ACTIVE-VERSION", vec![json!({"active_version": "v1"})]);
    let (mut client, _root) = client_with(&engine, false).await;
    client.load_active_version().await.unwrap();

    engine.fail_matching("SET-ACTIVE-VERSION");
    let err = client.set_active_version("v2").await.unwrap_err();
    assert!(matches!(err, ClientError::Query { .. }));

    // Cache and store must never disagree after a failed write.
    assert_eq!(client.active_version(), Some("v1"));
}

#[tokio::test]
async fn test_node_create_renders_and_commits() {
    let engine = MockEngine::new();
    let (client, _root) = client_with(&engine, false).await;

    client
        .node_create(&sample_node("n1"), Some("v1"))
        .await
        .unwrap();

    let calls = engine.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("NODE-CREATE case-x v1 id=n1"));
    assert!(calls[0].contains("10.5"));
    // No unreplaced placeholder survives rendering.
    assert!(!calls[0].contains('{'));
    assert_eq!(engine.commits(), 1);
}

#[tokio::test]
async fn test_optional_fields_render_as_empty_strings() {
    let engine = MockEngine::new();
    let (client, _root) = client_with(&engine, false).await;

    let node = BoardNode {
        picture_path: None,
        ..sample_node("n2")
    };
    client.node_create(&node, Some("v1")).await.unwrap();

    // "{picture_path} {description}" both empty: two trailing spaces.
    assert!(engine.calls()[0].ends_with("  "));
}

#[tokio::test]
async fn test_graph_by_version_get_parses_single_document() {
    let engine = MockEngine::new();
    engine.respond(
        "GRAPH-BY-VERSION-GET",
        vec![json!({
            "version": "v1",
            "nodes": [
                {"node_id": 7, "name": "a", "pos_x": 1.0, "pos_y": 2.0}
            ],
            "edges": []
        })],
    );
    let (client, _root) = client_with(&engine, false).await;

    let graph = client.graph_by_version_get(Some("v1")).await.unwrap();
    assert_eq!(graph.version, "v1");
    assert_eq!(graph.nodes.len(), 1);
    // Numeric store ids normalize to strings.
    assert_eq!(graph.nodes[0].node_id, "7");
}

#[tokio::test]
async fn test_graph_by_version_get_rejects_zero_documents() {
    let engine = MockEngine::new();
    let (client, _root) = client_with(&engine, false).await;

    let err = client.graph_by_version_get(Some("v1")).await.unwrap_err();
    match err {
        ClientError::Query { operation, detail } => {
            assert_eq!(operation, "graph-by-version-get");
            assert!(detail.contains("no documents"));
        }
        other => panic!("expected Query error, got: {other}"),
    }
}

#[tokio::test]
async fn test_graph_by_version_get_rejects_multiple_documents() {
    let engine = MockEngine::new();
    engine.respond(
        "GRAPH-BY-VERSION-GET",
        vec![json!({"version": "v1"}), json!({"version": "v1"})],
    );
    let (client, _root) = client_with(&engine, false).await;

    let err = client.graph_by_version_get(Some("v1")).await.unwrap_err();
    match err {
        ClientError::Query { detail, .. } => assert!(detail.contains("2 documents")),
        other => panic!("expected Query error, got: {other}"),
    }
}

#[tokio::test]
async fn test_get_versions_parses_list() {
    let engine = MockEngine::new();
    engine.respond(
        "GET-VERSIONS",
        vec![json!({
            "versions": [
                {"version": "v1", "name": "initial", "description": null},
                {"version": "v2", "name": null, "description": "wip"}
            ]
        })],
    );
    let (client, _root) = client_with(&engine, false).await;

    let versions = client.get_versions().await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].version, "v1");
    assert_eq!(versions[1].description.as_deref(), Some("wip"));
}

#[tokio::test]
async fn test_debug_gated_operations_fail_without_flag_and_touch_nothing() {
    let engine = MockEngine::new();
    let (client, _root) = client_with(&engine, false).await;

    assert!(matches!(
        client.create_database(None).await.unwrap_err(),
        ClientError::NotAllowed(_)
    ));
    assert!(matches!(
        client.drop_database(None).await.unwrap_err(),
        ClientError::NotAllowed(_)
    ));
    assert!(matches!(
        client.investigation_create().await.unwrap_err(),
        ClientError::NotAllowed(_)
    ));
    assert!(matches!(
        client.investigation_delete().await.unwrap_err(),
        ClientError::NotAllowed(_)
    ));

    // The gate fires before any engine interaction.
    assert_eq!(engine.total_calls(), 0);
    assert_eq!(engine.begins(), 0);
}

#[tokio::test]
async fn test_investigation_create_applies_schema_then_catalog_op() {
    let engine = MockEngine::new();
    let (client, _root) = client_with(&engine, true).await;

    client.investigation_create().await.unwrap();

    let calls = engine.calls();
    assert_eq!(calls[0], "SCHEMA-STATEMENT-ONE");
    assert_eq!(calls[1], "SCHEMA-STATEMENT-TWO");
    assert_eq!(calls[2], "INVESTIGATION-CREATE case-x");
    // One commit for the schema transaction, one for the write.
    assert_eq!(engine.commits(), 2);
}

#[tokio::test]
async fn test_investigation_create_schema_failure_skips_catalog_op() {
    let engine = MockEngine::new();
    engine.fail_matching("SCHEMA-STATEMENT-ONE");
    let (client, _root) = client_with(&engine, true).await;

    let err = client.investigation_create().await.unwrap_err();
    assert!(matches!(err, ClientError::Query { .. }));
    assert_eq!(engine.call_count("INVESTIGATION-CREATE"), 0);
}

#[tokio::test]
async fn test_commit_failure_surfaces_as_query_error() {
    let engine = MockEngine::new();
    engine.fail_commit();
    let (client, _root) = client_with(&engine, false).await;

    let err = client
        .graph_by_version_create("v3")
        .await
        .unwrap_err();
    match err {
        ClientError::Query { operation, .. } => {
            assert_eq!(operation, "graph-by-version-create");
        }
        other => panic!("expected Query error, got: {other}"),
    }
}
