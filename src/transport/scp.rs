// Scp Transport Implementation
// Delivers artifacts by spawning the system scp, the way the lab nodes
// exchange files in production. Authentication is a key file on disk.

use crate::membership::Peer;
use crate::transport::traits::{SecureTransport, TransportError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::time::{timeout, Duration};

// ============================================================================
// SCP CONFIG
// ============================================================================

/// Configuration for the scp transport
#[derive(Debug, Clone)]
pub struct ScpConfig {
    /// Remote login user
    pub user: String,
    /// Private key presented to the remote host
    pub identity_file: PathBuf,
    /// Exchange root on the remote host (received/ lives under it)
    pub remote_root: PathBuf,
    /// Connection timeout passed to scp, in seconds
    pub connect_timeout_secs: u32,
    /// Upper bound on one whole transfer, in seconds
    pub transfer_timeout_secs: u64,
    /// Binary to spawn
    pub scp_binary: String,
}

impl Default for ScpConfig {
    fn default() -> Self {
        Self {
            user: "vagrant".to_string(),
            identity_file: PathBuf::from("/home/vagrant/.ssh/id_ed25519"),
            remote_root: PathBuf::from("/home/vagrant/exchange"),
            connect_timeout_secs: 15,
            transfer_timeout_secs: 60,
            scp_binary: "scp".to_string(),
        }
    }
}

impl ScpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn with_identity_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.identity_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_remote_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.remote_root = path.as_ref().to_path_buf();
        self
    }

    pub fn with_connect_timeout(mut self, secs: u32) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_transfer_timeout(mut self, secs: u64) -> Self {
        self.transfer_timeout_secs = secs;
        self
    }
}

// ============================================================================
// SCP TRANSPORT
// ============================================================================

/// Transport that shells out to scp for each delivery
pub struct ScpTransport {
    config: ScpConfig,
}

impl ScpTransport {
    /// Create a transport with the given configuration
    pub fn new(config: ScpConfig) -> Self {
        Self { config }
    }

    /// Remote-side destination for a delivery
    fn remote_destination(&self, peer: &Peer, dest_name: &str) -> String {
        format!(
            "{}@{}:{}/received/{}",
            self.config.user,
            peer.address().host(),
            self.config.remote_root.display(),
            dest_name
        )
    }

    /// Full argument list for one scp invocation
    fn command_args(&self, peer: &Peer, source: &Path, dest_name: &str) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.config.identity_file.display().to_string(),
            "-P".to_string(),
            peer.address().port().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            source.display().to_string(),
            self.remote_destination(peer, dest_name),
        ]
    }
}

#[async_trait]
impl SecureTransport for ScpTransport {
    async fn deliver(
        &self,
        peer: &Peer,
        source: &Path,
        dest_name: &str,
    ) -> Result<(), TransportError> {
        let args = self.command_args(peer, source, dest_name);
        let run = Command::new(&self.config.scp_binary).args(&args).output();

        let output = timeout(Duration::from_secs(self.config.transfer_timeout_secs), run)
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::Rejected(format!(
                "scp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{NodeAddress, NodeName};

    fn peer() -> Peer {
        Peer::new(
            NodeName::new("ubuntu-server-2").unwrap(),
            NodeAddress::new("192.168.56.102", 22),
        )
    }

    #[test]
    fn test_remote_destination() {
        let transport = ScpTransport::new(ScpConfig::default());
        let dest = transport.remote_destination(&peer(), "from_a_20250514_010156.txt");

        assert_eq!(
            dest,
            "vagrant@192.168.56.102:/home/vagrant/exchange/received/from_a_20250514_010156.txt"
        );
    }

    #[test]
    fn test_command_args_carry_identity_and_port() {
        let config = ScpConfig::new()
            .with_identity_file("/keys/id_ed25519")
            .with_connect_timeout(5);
        let transport = ScpTransport::new(config);

        let args = transport.command_args(&peer(), Path::new("/tmp/report.txt"), "dest.txt");

        assert!(args.contains(&"/keys/id_ed25519".to_string()));
        assert!(args.contains(&"22".to_string()));
        assert!(args.contains(&"ConnectTimeout=5".to_string()));
        assert_eq!(args[args.len() - 2], "/tmp/report.txt");
    }
}
