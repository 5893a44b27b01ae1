//! Integration tests driving a host client against an engine server.
//!
//! Both ends run in-process over `tokio::io::duplex` with the headless engine.

use std::collections::HashSet;

use lineage::bridge::{BridgeClient, BridgeError, BridgeServer, NO_SELECTION};
use lineage::config::GraphConfig;
use lineage::engine::{HeadlessEngine, Rect};
use lineage::host::HostSession;
use lineage::models::{Hierarchy, SampleFactory};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

/// Starts an engine server and returns a connected client plus an engine
/// handle for inspection and clicks.
fn connect() -> (BridgeClient, HeadlessEngine) {
    let engine = HeadlessEngine::new();
    let (host, remote) = tokio::io::duplex(64 * 1024);
    tokio::spawn(BridgeServer::new(engine.clone()).serve(remote));
    (BridgeClient::connect(host), engine)
}

/// Client with an initialized graph whose selections land in the returned
/// receiver.
async fn initialized() -> (BridgeClient, HeadlessEngine, mpsc::UnboundedReceiver<i64>) {
    let (mut client, engine) = connect();
    let (tx, rx) = mpsc::unbounded_channel();
    let target = client.callbacks().register(move |id| {
        let _ = tx.send(id);
    });
    client
        .initialize_graph("#graphComponent", &target)
        .await
        .expect("initialize");
    (client, engine, rx)
}

#[tokio::test]
async fn test_node_ids_count_up_from_zero() {
    let (mut client, engine, _) = initialized().await;

    let mut ids = Vec::new();
    for i in 0..25 {
        ids.push(client.create_node(&format!("Person {}", i), None).await.unwrap());
    }

    assert_eq!(ids, (0..25).collect::<Vec<i64>>());
    assert_eq!(engine.node_count(), 25);
}

#[tokio::test]
async fn test_selection_round_trip() {
    let (mut client, engine, mut selections) = initialized().await;
    for i in 0..8 {
        client.create_node(&format!("Person {}", i), None).await.unwrap();
    }
    client.create_edge(0, 7).await.unwrap();

    assert!(engine.click_node(7));
    assert_eq!(selections.recv().await, Some(7));

    assert!(engine.click_canvas());
    assert_eq!(selections.recv().await, Some(NO_SELECTION));

    assert!(engine.click_label(3));
    assert_eq!(selections.recv().await, Some(NO_SELECTION));

    assert!(engine.click_edge(0));
    assert_eq!(selections.recv().await, Some(NO_SELECTION));
}

#[tokio::test]
async fn test_click_at_hits_node_bounds() {
    let (mut client, engine, mut selections) = initialized().await;
    client
        .create_node("Ada", Some(Rect::new(100.0, 100.0, 40.0, 20.0)))
        .await
        .unwrap();

    assert!(engine.click_at(110.0, 110.0));
    assert_eq!(selections.recv().await, Some(0));

    assert!(engine.click_at(0.0, 0.0));
    assert_eq!(selections.recv().await, Some(NO_SELECTION));
}

#[tokio::test]
async fn test_edge_with_unknown_id_is_ignored() {
    let (mut client, engine, _) = initialized().await;
    let a = client.create_node("A", None).await.unwrap();

    client.create_edge(a, 42).await.unwrap();
    client.create_edge(-1, a).await.unwrap();
    assert_eq!(engine.edge_count(), 0);
}

#[tokio::test]
async fn test_calls_before_initialize_fail() {
    let (mut client, engine) = connect();

    assert_eq!(
        client.create_node("A", None).await.unwrap_err(),
        BridgeError::NotInitialized
    );
    assert_eq!(
        client.create_edge(0, 1).await.unwrap_err(),
        BridgeError::NotInitialized
    );
    assert_eq!(
        client.apply_hierarchic_layout().await.unwrap_err(),
        BridgeError::NotInitialized
    );
    assert!(client.create_node("A", None).await.unwrap_err().is_precondition());
    assert_eq!(engine.node_count(), 0);
}

#[tokio::test]
async fn test_second_initialize_fails() {
    let (mut client, _engine, _) = initialized().await;
    let target = client.callbacks().register(|_| {});
    assert_eq!(
        client
            .initialize_graph("#other", &target)
            .await
            .unwrap_err(),
        BridgeError::AlreadyInitialized
    );
}

#[tokio::test]
async fn test_non_finite_rect_rejected() {
    let (mut client, engine, _) = initialized().await;
    let err = client
        .create_node("A", Some(Rect::new(0.0, 0.0, f64::NAN, 10.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidRect(_)));
    assert_eq!(engine.node_count(), 0);
}

#[tokio::test]
async fn test_host_session_renders_and_tracks_selection() {
    let (client, engine) = connect();
    let mut rng = StdRng::seed_from_u64(2024);
    let hierarchy = Hierarchy::random(20, 4, &mut rng, &SampleFactory);
    let graph = GraphConfig {
        node_width: Some(40.0),
        node_height: Some(40.0),
        ..GraphConfig::default()
    };

    let mut session = HostSession::render(client, hierarchy, &graph)
        .await
        .unwrap();

    assert_eq!(engine.node_count(), 20);
    assert_eq!(engine.edge_count(), 19);
    assert_eq!(engine.layouts().len(), 1);

    let edges: HashSet<(usize, usize)> = engine.edges().into_iter().collect();
    for link in session.hierarchy().links() {
        assert!(edges.contains(&(link.parent, link.child)));
    }
    for (index, person) in session.hierarchy().people().iter().enumerate() {
        assert_eq!(engine.labels(index).unwrap(), vec![person.to_string()]);
    }

    engine.click_node(7);
    assert_eq!(session.selection_changed().await.unwrap(), Some(7));
    let expected = session.hierarchy().person(7).cloned();
    assert_eq!(session.selected().cloned(), expected);

    engine.click_canvas();
    assert_eq!(session.selection_changed().await.unwrap(), None);
    assert!(session.selected().is_none());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let (mut first, first_engine, _) = initialized().await;
    let (mut second, second_engine, _) = initialized().await;

    first.create_node("A", None).await.unwrap();
    first.create_node("B", None).await.unwrap();
    assert_eq!(second.create_node("C", None).await.unwrap(), 0);

    assert_eq!(first_engine.node_count(), 2);
    assert_eq!(second_engine.node_count(), 1);
}
