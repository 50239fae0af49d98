// Local Transport Implementation
// Delivers into a sibling directory tree instead of a remote host. Used for
// single-host simulation of the whole mesh and by the end-to-end tests.

use crate::membership::Peer;
use crate::transport::traits::{SecureTransport, TransportError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Transport that copies artifacts between per-node directories on one host
///
/// Each node's exchange root lives at `<network_root>/<node-name>/`. A missing
/// received/ directory stands in for an unreachable host: the delivery fails
/// the same way a refused connection would.
pub struct LocalTransport {
    network_root: PathBuf,
}

impl LocalTransport {
    /// Create a transport over the given network root
    pub fn new<P: AsRef<Path>>(network_root: P) -> Self {
        Self {
            network_root: network_root.as_ref().to_path_buf(),
        }
    }

    /// Received-store directory of a peer
    fn received_dir(&self, peer: &Peer) -> PathBuf {
        self.network_root.join(peer.name().as_str()).join("received")
    }
}

#[async_trait]
impl SecureTransport for LocalTransport {
    async fn deliver(
        &self,
        peer: &Peer,
        source: &Path,
        dest_name: &str,
    ) -> Result<(), TransportError> {
        let dir = self.received_dir(peer);
        if !dir.is_dir() {
            return Err(TransportError::DestinationUnavailable(format!(
                "{}",
                dir.display()
            )));
        }

        tokio::fs::copy(source, dir.join(dest_name))
            .await
            .map_err(|e| TransportError::CopyFailed(e.to_string()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
