// Configuration - TOML mesh description loaded once at startup
//
// Everything the agent needs is in one file: the exchange root, transport
// settings, and the full node roster. The roster is never re-derived from
// environment inspection; it is parsed, validated, and passed explicitly.

use crate::membership::{MembershipError, NodeAddress, NodeName, Peer, Roster, DEFAULT_PORT};
use crate::transport::ScpConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFailed(String),

    #[error("Failed to parse config file: {0}")]
    ParseFailed(String),

    #[error("Config lists no nodes")]
    NoNodes,

    #[error("Invalid membership: {0}")]
    Membership(#[from] MembershipError),
}

/// Transport section of the config file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportSettings {
    /// Remote login user
    #[serde(default = "default_user")]
    pub user: String,
    /// Private key presented to remote hosts
    #[serde(default = "default_identity_file")]
    pub identity_file: PathBuf,
    /// Exchange root on remote hosts; defaults to the local exchange root
    #[serde(default)]
    pub remote_root: Option<PathBuf>,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u32,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            user: default_user(),
            identity_file: default_identity_file(),
            remote_root: None,
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_user() -> String {
    "vagrant".to_string()
}

fn default_identity_file() -> PathBuf {
    PathBuf::from("/home/vagrant/.ssh/id_ed25519")
}

fn default_connect_timeout() -> u32 {
    15
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// One roster entry in the config file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeEntry {
    pub name: NodeName,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// The whole mesh configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MeshConfig {
    /// Node-local exchange root (sent/, received/, logs/ live under it)
    pub exchange_root: PathBuf,
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

impl MeshConfig {
    /// Load and parse a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(format!("{}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse config contents
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Build the validated roster
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        if self.nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }

        let entries = self
            .nodes
            .iter()
            .map(|n| {
                Peer::new(
                    n.name.clone(),
                    NodeAddress::new(&n.host, n.port),
                )
            })
            .collect();
        Ok(Roster::new(entries)?)
    }

    /// Scp transport configuration derived from the transport section
    pub fn scp_config(&self) -> ScpConfig {
        let remote_root = self
            .transport
            .remote_root
            .clone()
            .unwrap_or_else(|| self.exchange_root.clone());

        ScpConfig::new()
            .with_user(&self.transport.user)
            .with_identity_file(&self.transport.identity_file)
            .with_remote_root(remote_root)
            .with_connect_timeout(self.transport.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
exchange_root = "/home/vagrant/exchange"

[transport]
user = "vagrant"
identity_file = "/home/vagrant/.ssh/id_ed25519"
connect_timeout_secs = 10

[[nodes]]
name = "ubuntu-server-1"
host = "192.168.56.101"

[[nodes]]
name = "ubuntu-server-2"
host = "192.168.56.102"
port = 2222
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = MeshConfig::parse(SAMPLE).unwrap();

        assert_eq!(config.exchange_root, PathBuf::from("/home/vagrant/exchange"));
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.nodes[0].port, 22);
        assert_eq!(config.nodes[1].port, 2222);
        assert_eq!(config.transport.connect_timeout_secs, 10);
    }

    #[test]
    fn test_roster_from_config() {
        let config = MeshConfig::parse(SAMPLE).unwrap();
        let roster = config.roster().unwrap();

        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&NodeName::new("ubuntu-server-2").unwrap()));
    }

    #[test]
    fn test_empty_nodes_rejected() {
        let config = MeshConfig::parse("exchange_root = \"/tmp/exchange\"").unwrap();
        assert!(matches!(config.roster(), Err(ConfigError::NoNodes)));
    }

    #[test]
    fn test_invalid_node_name_rejected_at_parse() {
        let bad = SAMPLE.replace("ubuntu-server-1", "bad_name");
        assert!(matches!(MeshConfig::parse(&bad), Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_scp_config_defaults_remote_root_to_exchange_root() {
        let config = MeshConfig::parse(SAMPLE).unwrap();
        let scp = config.scp_config();

        assert_eq!(scp.remote_root, PathBuf::from("/home/vagrant/exchange"));
        assert_eq!(scp.user, "vagrant");
    }
}
