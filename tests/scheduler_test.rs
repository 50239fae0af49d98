// Scheduler Tests
// End-to-end exchange cycles over a local mesh tree

use async_trait::async_trait;
use statusmesh::artifact::ExchangeLayout;
use statusmesh::exchange::{CycleError, ExchangeScheduler, TargetSelector};
use statusmesh::ledger::HISTORY_HEADER;
use statusmesh::membership::{NodeAddress, NodeName, Peer, Roster};
use statusmesh::transport::{LocalTransport, SecureTransport, TransportError};
use std::path::Path;
use tempfile::TempDir;

fn node(name: &str) -> NodeName {
    NodeName::new(name).unwrap()
}

fn roster(names: &[&str]) -> Roster {
    Roster::new(
        names
            .iter()
            .map(|n| Peer::new(node(n), NodeAddress::on_default_port("127.0.0.1")))
            .collect(),
    )
    .unwrap()
}

/// Lay out exchange roots for each node under one mesh directory
fn build_mesh(net: &Path, names: &[&str]) {
    for name in names {
        ExchangeLayout::new(net.join(name)).ensure().unwrap();
    }
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Deterministic selector: always the first resolved peer
struct FirstPeerSelector;

impl TargetSelector for FirstPeerSelector {
    fn select<'a>(&mut self, peers: &'a [Peer]) -> Vec<&'a Peer> {
        peers.first().into_iter().collect()
    }
}

/// Transport that refuses every delivery
struct FailingTransport;

#[async_trait]
impl SecureTransport for FailingTransport {
    async fn deliver(
        &self,
        _peer: &Peer,
        _source: &Path,
        _dest_name: &str,
    ) -> Result<(), TransportError> {
        Err(TransportError::Rejected("connection refused".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

// ============================================================================
// HAPPY PATH
// ============================================================================

#[tokio::test]
async fn test_cycle_delivers_to_selected_peer_only() {
    let net = TempDir::new().unwrap();
    build_mesh(net.path(), &["a", "b", "c"]);

    let layout = ExchangeLayout::new(net.path().join("a"));
    let mut scheduler = ExchangeScheduler::new(
        node("a"),
        roster(&["a", "b", "c"]),
        layout.clone(),
        Box::new(LocalTransport::new(net.path())),
    )
    .with_selector(Box::new(FirstPeerSelector));

    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 0);

    // A's sent store holds the artifact
    let sent = list(&layout.sent_dir());
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("status_a_"));

    // B (first peer of A) received it under the delivery name
    let received = list(&net.path().join("b").join("received"));
    assert_eq!(received.len(), 1);
    assert!(received[0].starts_with("from_a_"));

    // C is untouched
    assert!(list(&net.path().join("c").join("received")).is_empty());
    assert!(list(&net.path().join("c").join("sent")).is_empty());

    // Exactly one ledger row: header + success row for B
    let history = std::fs::read_to_string(layout.history_file()).unwrap();
    let lines: Vec<&str> = history.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], HISTORY_HEADER);
    assert!(lines[1].contains(",a,sent,b,status_a_"));
    assert!(lines[1].ends_with(",success"));
}

#[tokio::test]
async fn test_consecutive_cycles_accumulate() {
    let net = TempDir::new().unwrap();
    build_mesh(net.path(), &["a", "b"]);

    let layout = ExchangeLayout::new(net.path().join("a"));
    let mut scheduler = ExchangeScheduler::new(
        node("a"),
        roster(&["a", "b"]),
        layout.clone(),
        Box::new(LocalTransport::new(net.path())),
    );

    scheduler.run_cycle().await.unwrap();
    scheduler.run_cycle().await.unwrap();

    // Single peer, so both cycles targeted b; rows accumulate under one header
    let history = std::fs::read_to_string(layout.history_file()).unwrap();
    assert_eq!(history.lines().count(), 3);
}

// ============================================================================
// FAILURE ISOLATION
// ============================================================================

#[tokio::test]
async fn test_unreachable_peer_recorded_not_raised() {
    let net = TempDir::new().unwrap();
    // Only A exists; B's store is missing, standing in for an unreachable host
    build_mesh(net.path(), &["a"]);

    let layout = ExchangeLayout::new(net.path().join("a"));
    let mut scheduler = ExchangeScheduler::new(
        node("a"),
        roster(&["a", "b"]),
        layout.clone(),
        Box::new(LocalTransport::new(net.path())),
    );

    let report = scheduler.run_cycle().await.unwrap();
    assert_eq!(report.failed(), 1);

    // The artifact stays in A's sent store
    assert_eq!(list(&layout.sent_dir()).len(), 1);

    // The ledger records the failed attempt
    let history = std::fs::read_to_string(layout.history_file()).unwrap();
    let lines: Vec<&str> = history.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains(",a,sent,b,"));
    assert!(lines[1].ends_with(",failure"));
}

#[tokio::test]
async fn test_every_attempt_gets_a_row_when_all_fail() {
    let net = TempDir::new().unwrap();
    build_mesh(net.path(), &["a", "b", "c"]);

    let layout = ExchangeLayout::new(net.path().join("a"));
    let mut scheduler = ExchangeScheduler::new(
        node("a"),
        roster(&["a", "b", "c"]),
        layout.clone(),
        Box::new(FailingTransport),
    );

    let report = scheduler.run_cycle().await.unwrap();
    assert!(report.failed() >= 1);
    assert_eq!(report.succeeded(), 0);

    let history = std::fs::read_to_string(layout.history_file()).unwrap();
    assert_eq!(history.lines().count(), 1 + report.outcomes.len());
}

// ============================================================================
// FATAL ERRORS
// ============================================================================

#[tokio::test]
async fn test_unknown_identity_aborts_before_any_transfer() {
    let net = TempDir::new().unwrap();
    build_mesh(net.path(), &["a", "b", "z"]);

    let layout = ExchangeLayout::new(net.path().join("z"));
    let mut scheduler = ExchangeScheduler::new(
        node("z"),
        roster(&["a", "b"]),
        layout.clone(),
        Box::new(LocalTransport::new(net.path())),
    );

    let result = scheduler.run_cycle().await;
    assert!(matches!(result, Err(CycleError::Configuration(_))));

    // No transfer was attempted, so no ledger was created
    assert!(!layout.history_file().exists());
    assert!(list(&net.path().join("a").join("received")).is_empty());
    assert!(list(&net.path().join("b").join("received")).is_empty());
}

#[tokio::test]
async fn test_unwritable_sent_store_is_fatal() {
    let net = TempDir::new().unwrap();
    build_mesh(net.path(), &["a", "b"]);

    // Layout whose directories were never created
    let layout = ExchangeLayout::new(net.path().join("broken"));
    let mut scheduler = ExchangeScheduler::new(
        node("a"),
        roster(&["a", "b"]),
        layout,
        Box::new(LocalTransport::new(net.path())),
    );

    let result = scheduler.run_cycle().await;
    assert!(matches!(result, Err(CycleError::ArtifactWrite(_))));
    assert!(list(&net.path().join("b").join("received")).is_empty());
}
