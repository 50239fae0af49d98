// Artifact Stores - Directory-backed sent/ and received/ stores
//
// Store state is never tracked independently; it is recomputed by listing the
// directory at read time. The only write path is the sent store, fed by the
// scheduler. Receivers gain files through the transport, outside this process.

use crate::artifact::report::StatusReport;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from artifact store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to create store directory: {0}")]
    CreateFailed(String),

    #[error("Failed to write artifact: {0}")]
    WriteFailed(String),

    #[error("Failed to list store: {0}")]
    ListFailed(String),

    #[error("Failed to read file metadata: {0}")]
    MetadataFailed(String),
}

// ============================================================================
// LAYOUT
// ============================================================================

/// Per-node directory layout, relative to the exchange root
///
/// ```text
/// <root>/sent/              artifacts this node produced
/// <root>/received/          artifacts delivered by peers
/// <root>/logs/exchange.log  free-text operational log
/// <root>/logs/history.csv   transfer ledger
/// ```
#[derive(Clone, Debug)]
pub struct ExchangeLayout {
    root: PathBuf,
}

impl ExchangeLayout {
    /// Create a layout rooted at the given directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the exchange root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of locally produced artifacts
    pub fn sent_dir(&self) -> PathBuf {
        self.root.join("sent")
    }

    /// Directory of artifacts delivered by peers
    pub fn received_dir(&self) -> PathBuf {
        self.root.join("received")
    }

    /// Directory holding the operational log and the ledger
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Path of the transfer ledger
    pub fn history_file(&self) -> PathBuf {
        self.logs_dir().join("history.csv")
    }

    /// Path of the free-text operational log
    pub fn exchange_log_file(&self) -> PathBuf {
        self.logs_dir().join("exchange.log")
    }

    /// Create all layout directories
    pub fn ensure(&self) -> Result<(), StoreError> {
        for dir in [self.sent_dir(), self.received_dir(), self.logs_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|e| StoreError::CreateFailed(format!("{}: {}", dir.display(), e)))?;
        }
        Ok(())
    }
}

// ============================================================================
// SENT STORE
// ============================================================================

/// An artifact durably written to the sent store
#[derive(Clone, Debug)]
pub struct StoredArtifact {
    file_name: String,
    path: PathBuf,
}

impl StoredArtifact {
    /// Get the artifact filename
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Get the full path on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Store of artifacts this node produced
#[derive(Clone, Debug)]
pub struct SentStore {
    dir: PathBuf,
}

impl SentStore {
    /// Create a sent store over the given directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a report into the store
    ///
    /// Failure here is fatal for the cycle: with no local artifact there is
    /// nothing to transfer.
    pub fn write(&self, report: &StatusReport) -> Result<StoredArtifact, StoreError> {
        let file_name = report.file_name();
        let path = self.dir.join(&file_name);
        fs::write(&path, report.render())
            .map_err(|e| StoreError::WriteFailed(format!("{}: {}", path.display(), e)))?;
        Ok(StoredArtifact { file_name, path })
    }

    /// List artifact filenames, sorted
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        list_files(&self.dir)
    }

    /// Number of artifacts currently in the store
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }
}

// ============================================================================
// RECEIVED STORE
// ============================================================================

/// Store of artifacts delivered by peers
#[derive(Clone, Debug)]
pub struct ReceivedStore {
    dir: PathBuf,
}

impl ReceivedStore {
    /// Create a received store over the given directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the store directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List artifact filenames, sorted
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        list_files(&self.dir)
    }

    /// Number of artifacts currently in the store
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list()?.len())
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Point-in-time counts over both stores, recomputed from directory contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeSnapshot {
    pub sent: usize,
    pub received: usize,
}

impl ExchangeSnapshot {
    /// Take a snapshot of the given stores
    pub fn take(sent: &SentStore, received: &ReceivedStore) -> Result<Self, StoreError> {
        Ok(Self {
            sent: sent.count()?,
            received: received.count()?,
        })
    }
}

/// Sorted filenames of regular files in a directory
fn list_files(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries =
        fs::read_dir(dir).map_err(|e| StoreError::ListFailed(format!("{}: {}", dir.display(), e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::ListFailed(e.to_string()))?;
        let is_file = entry
            .file_type()
            .map_err(|e| StoreError::MetadataFailed(e.to_string()))?
            .is_file();
        if is_file {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::NodeName;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = ExchangeLayout::new("/home/vagrant/exchange");
        assert_eq!(layout.sent_dir(), PathBuf::from("/home/vagrant/exchange/sent"));
        assert_eq!(
            layout.history_file(),
            PathBuf::from("/home/vagrant/exchange/logs/history.csv")
        );
    }

    #[test]
    fn test_layout_ensure_creates_dirs() {
        let temp = TempDir::new().unwrap();
        let layout = ExchangeLayout::new(temp.path());

        layout.ensure().unwrap();

        assert!(layout.sent_dir().is_dir());
        assert!(layout.received_dir().is_dir());
        assert!(layout.logs_dir().is_dir());
    }

    #[test]
    fn test_sent_store_write_and_list() {
        let temp = TempDir::new().unwrap();
        let store = SentStore::new(temp.path());
        let report = StatusReport::new(NodeName::new("a").unwrap(), Utc::now());

        let artifact = store.write(&report).unwrap();

        assert!(artifact.path().is_file());
        assert_eq!(store.list().unwrap(), vec![artifact.file_name().to_string()]);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_sent_store_write_fails_without_directory() {
        let temp = TempDir::new().unwrap();
        let store = SentStore::new(temp.path().join("missing"));
        let report = StatusReport::new(NodeName::new("a").unwrap(), Utc::now());

        assert!(matches!(store.write(&report), Err(StoreError::WriteFailed(_))));
    }

    #[test]
    fn test_snapshot_counts_both_stores() {
        let temp = TempDir::new().unwrap();
        let layout = ExchangeLayout::new(temp.path());
        layout.ensure().unwrap();

        let sent = SentStore::new(layout.sent_dir());
        let received = ReceivedStore::new(layout.received_dir());
        sent.write(&StatusReport::new(NodeName::new("a").unwrap(), Utc::now()))
            .unwrap();

        let snapshot = ExchangeSnapshot::take(&sent, &received).unwrap();
        assert_eq!(snapshot, ExchangeSnapshot { sent: 1, received: 0 });
    }
}
