// History Ledger - Append-only CSV record of every transfer attempt
//
// One row per attempt, success or failure, never mutated and never batched.
// The file is created with a fixed header on first append; afterwards the only
// operation is appending whole lines, so a crash mid-cycle leaves the log at
// its last fully-appended row. Only the local scheduler writes this file.

use crate::membership::NodeName;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Fixed ledger header
pub const HISTORY_HEADER: &str = "timestamp,hostname,action,target_servers,file,status";

/// Timestamp format of the ledger's first column
const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ledger-related errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to open ledger: {0}")]
    OpenFailed(String),

    #[error("Failed to append to ledger: {0}")]
    AppendFailed(String),

    #[error("Failed to read ledger: {0}")]
    ReadFailed(String),

    #[error("Malformed ledger row: {0}")]
    MalformedRow(String),
}

// ============================================================================
// RECORD FIELDS
// ============================================================================

/// Direction of an exchange, as recorded in the `action` column
///
/// The scheduler only ever writes `sent`; `received` is part of the on-disk
/// schema so read-back tolerates rows written by the wider lab tooling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExchangeAction {
    Sent,
    Received,
}

impl fmt::Display for ExchangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Received => write!(f, "received"),
        }
    }
}

impl FromStr for ExchangeAction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "received" => Ok(Self::Received),
            other => Err(LedgerError::MalformedRow(format!("unknown action: {other}"))),
        }
    }
}

/// Outcome of one transfer attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    Success,
    Failure,
}

impl TransferStatus {
    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl FromStr for TransferStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(LedgerError::MalformedRow(format!("unknown status: {other}"))),
        }
    }
}

// ============================================================================
// TRANSFER RECORD
// ============================================================================

/// One ledger row: a single transfer attempt and its outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRecord {
    timestamp: DateTime<Utc>,
    hostname: NodeName,
    action: ExchangeAction,
    target: NodeName,
    file: String,
    status: TransferStatus,
}

impl TransferRecord {
    /// Record for an outbound transfer attempt
    pub fn sent(
        timestamp: DateTime<Utc>,
        hostname: NodeName,
        target: NodeName,
        file: &str,
        status: TransferStatus,
    ) -> Self {
        Self {
            timestamp,
            hostname,
            action: ExchangeAction::Sent,
            target,
            file: file.to_string(),
            status,
        }
    }

    /// Get the record timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the recording node
    pub fn hostname(&self) -> &NodeName {
        &self.hostname
    }

    /// Get the exchange direction
    pub fn action(&self) -> ExchangeAction {
        self.action
    }

    /// Get the transfer target
    pub fn target(&self) -> &NodeName {
        &self.target
    }

    /// Get the artifact filename
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Get the outcome
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Render this record as one CSV row (no trailing newline)
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.timestamp.format(ROW_TIMESTAMP_FORMAT),
            self.hostname,
            self.action,
            self.target,
            self.file,
            self.status
        )
    }

    /// Parse one CSV row back into a record
    pub fn from_row(row: &str) -> Result<Self, LedgerError> {
        let fields: Vec<&str> = row.split(',').collect();
        if fields.len() != 6 {
            return Err(LedgerError::MalformedRow(row.to_string()));
        }

        let timestamp = NaiveDateTime::parse_from_str(fields[0], ROW_TIMESTAMP_FORMAT)
            .map_err(|e| LedgerError::MalformedRow(format!("{row}: {e}")))?
            .and_utc();
        let hostname = NodeName::new(fields[1])
            .map_err(|e| LedgerError::MalformedRow(format!("{row}: {e}")))?;
        let action = fields[2].parse()?;
        let target = NodeName::new(fields[3])
            .map_err(|e| LedgerError::MalformedRow(format!("{row}: {e}")))?;
        let status = fields[5].parse()?;

        Ok(Self {
            timestamp,
            hostname,
            action,
            target,
            file: fields[4].to_string(),
            status,
        })
    }
}

// ============================================================================
// HISTORY LEDGER
// ============================================================================

/// The durable append-only transfer ledger
#[derive(Clone, Debug)]
pub struct HistoryLedger {
    path: PathBuf,
}

impl HistoryLedger {
    /// Create a ledger handle for the given file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the ledger path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single record
    ///
    /// Creates the file with the header if it is absent or empty; otherwise
    /// appends only. Header and row are handed to the file in one write each,
    /// so prior rows are never touched.
    pub fn append(&self, record: &TransferRecord) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::OpenFailed(format!("{}: {}", self.path.display(), e)))?;

        let needs_header = file
            .metadata()
            .map_err(|e| LedgerError::OpenFailed(e.to_string()))?
            .len()
            == 0;

        let mut line = String::new();
        if needs_header {
            line.push_str(HISTORY_HEADER);
            line.push('\n');
        }
        line.push_str(&record.to_row());
        line.push('\n');

        file.write_all(line.as_bytes())
            .map_err(|e| LedgerError::AppendFailed(e.to_string()))?;
        file.flush()
            .map_err(|e| LedgerError::AppendFailed(e.to_string()))?;
        Ok(())
    }

    /// Read every record back, oldest first
    ///
    /// A missing ledger is an empty history, not an error.
    pub fn read_records(&self) -> Result<Vec<TransferRecord>, LedgerError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LedgerError::ReadFailed(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let mut records = Vec::new();
        for line in contents.lines().skip(1) {
            if line.is_empty() {
                continue;
            }
            records.push(TransferRecord::from_row(line)?);
        }
        Ok(records)
    }
}
