// Exchange Scheduler - One fire-and-forget cycle per timer tick
//
// The scheduler is not self-triggering; an external cron-equivalent invokes
// run_cycle. Within a cycle: write the artifact, resolve peers, select
// targets, deliver sequentially, append one ledger row per attempt. A failed
// transfer never aborts its siblings, and nothing is retried.

use crate::artifact::{ExchangeLayout, SentStore, StatusReport, StoreError};
use crate::exchange::selector::{FanOutSelector, TargetSelector};
use crate::ledger::{HistoryLedger, TransferRecord, TransferStatus};
use crate::membership::{MembershipError, NodeName, Roster};
use crate::transport::SecureTransport;
use chrono::Utc;
use rand::Rng;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that abort a whole cycle
///
/// Transfer and ledger failures are deliberately absent: the former are
/// isolated per target, the latter best-effort.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] MembershipError),

    #[error("Artifact write failed: {0}")]
    ArtifactWrite(#[from] StoreError),
}

// ============================================================================
// CYCLE ID
// ============================================================================

/// Correlates the log lines of one cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleId([u8; 8]);

impl CycleId {
    /// Generate a new random cycle ID
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ============================================================================
// CYCLE REPORT
// ============================================================================

/// Result of one transfer attempt within a cycle
#[derive(Clone, Debug)]
pub struct TransferOutcome {
    pub target: NodeName,
    pub status: TransferStatus,
    pub error: Option<String>,
}

/// What one cycle did, for logging and tests
///
/// The binary logs this and discards it; the timer sees only the exit status.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    pub artifact: String,
    pub outcomes: Vec<TransferOutcome>,
}

impl CycleReport {
    /// Number of successful transfers
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.is_success())
            .count()
    }

    /// Number of failed transfers
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Drives one exchange cycle at a time for a single node
pub struct ExchangeScheduler {
    node: NodeName,
    roster: Roster,
    layout: ExchangeLayout,
    transport: Box<dyn SecureTransport>,
    selector: Box<dyn TargetSelector>,
    ledger: HistoryLedger,
}

impl ExchangeScheduler {
    /// Create a scheduler with the default entropy-seeded selector
    pub fn new(
        node: NodeName,
        roster: Roster,
        layout: ExchangeLayout,
        transport: Box<dyn SecureTransport>,
    ) -> Self {
        let ledger = HistoryLedger::new(layout.history_file());
        Self {
            node,
            roster,
            layout,
            transport,
            selector: Box::new(FanOutSelector::new()),
            ledger,
        }
    }

    /// Replace the target selector (seeded selectors for deterministic runs)
    pub fn with_selector(mut self, selector: Box<dyn TargetSelector>) -> Self {
        self.selector = selector;
        self
    }

    /// Get this scheduler's node
    pub fn node(&self) -> &NodeName {
        &self.node
    }

    /// Get the layout the scheduler operates on
    pub fn layout(&self) -> &ExchangeLayout {
        &self.layout
    }

    /// Run one exchange cycle
    ///
    /// Only configuration and artifact-write failures propagate; transfer
    /// failures are recorded in the ledger and ledger failures are logged.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let cycle_id = CycleId::generate();
        let started = Utc::now();
        info!(cycle = %cycle_id, node = %self.node, "starting exchange cycle");

        let report = StatusReport::new(self.node.clone(), started)
            .with_line(&format!("cycle: {}", cycle_id));
        let sent_store = SentStore::new(self.layout.sent_dir());
        let artifact = sent_store.write(&report)?;
        info!(cycle = %cycle_id, file = %artifact.file_name(), "artifact written");

        let peers = self.roster.peers_of(&self.node)?;
        let targets = self.selector.select(&peers);
        let target_names: Vec<&str> = targets.iter().map(|p| p.name().as_str()).collect();
        info!(
            cycle = %cycle_id,
            transport = self.transport.name(),
            targets = ?target_names,
            "targets selected"
        );

        let delivery_name = report.delivery_name();
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let attempt = self
                .transport
                .deliver(target, artifact.path(), &delivery_name)
                .await;

            let (status, error) = match attempt {
                Ok(()) => {
                    info!(cycle = %cycle_id, target = %target.name(), "transfer succeeded");
                    (TransferStatus::Success, None)
                }
                Err(e) => {
                    warn!(cycle = %cycle_id, target = %target.name(), error = %e, "transfer failed");
                    (TransferStatus::Failure, Some(e.to_string()))
                }
            };

            let record = TransferRecord::sent(
                Utc::now(),
                self.node.clone(),
                target.name().clone(),
                artifact.file_name(),
                status,
            );
            if let Err(e) = self.ledger.append(&record) {
                warn!(cycle = %cycle_id, error = %e, "ledger append failed");
            }

            outcomes.push(TransferOutcome {
                target: target.name().clone(),
                status,
                error,
            });
        }

        let cycle_report = CycleReport {
            cycle_id,
            artifact: artifact.file_name().to_string(),
            outcomes,
        };
        info!(
            cycle = %cycle_id,
            succeeded = cycle_report.succeeded(),
            failed = cycle_report.failed(),
            "cycle complete"
        );
        Ok(cycle_report)
    }
}
