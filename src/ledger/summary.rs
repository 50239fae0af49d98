// Received Summary - Point-in-time report over the received store
//
// Purely a read over current directory contents: nothing is cached or derived,
// so repeated calls with no intervening writes return identical listings.
// Entries are ordered by filename.

use crate::artifact::{parse_delivery_name, ReceivedStore, StoreError};
use crate::membership::NodeName;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;

/// One received artifact: name, size, and modification time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedEntry {
    file_name: String,
    size_bytes: u64,
    modified: DateTime<Utc>,
    sender: Option<NodeName>,
}

impl ReceivedEntry {
    /// Get the filename
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get the file size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Get the modification time
    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Get the sender parsed from the delivery name, if it follows the scheme
    pub fn sender(&self) -> Option<&NodeName> {
        self.sender.as_ref()
    }
}

impl fmt::Display for ReceivedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- {} (Size: {} bytes, Date: {})",
            self.file_name,
            self.size_bytes,
            self.modified.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Summary of every artifact currently in the received store
#[derive(Clone, Debug, Default)]
pub struct ReceivedSummary {
    entries: Vec<ReceivedEntry>,
}

impl ReceivedSummary {
    /// Get the entries, sorted by filename
    pub fn entries(&self) -> &[ReceivedEntry] {
        &self.entries
    }

    /// Total number of received artifacts
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Artifact counts grouped by sender
    pub fn per_sender(&self) -> BTreeMap<NodeName, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            if let Some(sender) = entry.sender() {
                *counts.entry(sender.clone()).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl fmt::Display for ReceivedSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Received files: {}", self.total())?;
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Produce a summary of the received store
pub fn summarize(store: &ReceivedStore) -> Result<ReceivedSummary, StoreError> {
    let mut entries = Vec::new();
    for file_name in store.list()? {
        let path = store.dir().join(&file_name);
        let metadata = fs::metadata(&path)
            .map_err(|e| StoreError::MetadataFailed(format!("{}: {}", path.display(), e)))?;
        let modified = metadata
            .modified()
            .map_err(|e| StoreError::MetadataFailed(e.to_string()))?;

        let sender = parse_delivery_name(&file_name).map(|info| info.sender);
        entries.push(ReceivedEntry {
            file_name,
            size_bytes: metadata.len(),
            modified: DateTime::<Utc>::from(modified),
            sender,
        });
    }
    Ok(ReceivedSummary { entries })
}
