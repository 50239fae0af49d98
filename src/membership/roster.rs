// Roster - Static membership for the exchange mesh
//
// The set of participating nodes is fixed at process start and loaded from
// configuration, never discovered. Resolution answers one question: given this
// node's identity, who are the peers and where do they live.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default ssh port for peer addresses
pub const DEFAULT_PORT: u16 = 22;

/// Membership-related errors
#[derive(Error, Debug)]
pub enum MembershipError {
    #[error("Unknown node identity: {0}")]
    UnknownNode(String),

    #[error("Membership has no peers for this node")]
    EmptyMembership,

    #[error("Duplicate node name in roster: {0}")]
    DuplicateNode(String),

    #[error("Invalid node name: {0}")]
    InvalidName(String),
}

// ============================================================================
// NODE NAME
// ============================================================================

/// Hostname-equivalent identity of a node, unique within the roster
///
/// Names appear as fields in artifact filenames (delimited by `_`) and in
/// ledger rows (delimited by `,`), so both delimiters are rejected here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
    /// Create a validated node name
    pub fn new(name: &str) -> Result<Self, MembershipError> {
        if name.is_empty() {
            return Err(MembershipError::InvalidName("empty name".to_string()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(MembershipError::InvalidName(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for NodeName {
    type Error = MembershipError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<NodeName> for String {
    fn from(name: NodeName) -> Self {
        name.0
    }
}

// ============================================================================
// NODE ADDRESS
// ============================================================================

/// Network address of a node (ssh host and port)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    host: String,
    port: u16,
}

impl NodeAddress {
    /// Create an address with an explicit port
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }

    /// Create an address on the default ssh port
    pub fn on_default_port(host: &str) -> Self {
        Self::new(host, DEFAULT_PORT)
    }

    /// Get the host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ============================================================================
// PEER
// ============================================================================

/// A roster entry handed to the transport: name plus address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer {
    name: NodeName,
    address: NodeAddress,
}

impl Peer {
    /// Create a new peer entry
    pub fn new(name: NodeName, address: NodeAddress) -> Self {
        Self { name, address }
    }

    /// Get the node name
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Get the address
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }
}

// ============================================================================
// ROSTER
// ============================================================================

/// The fixed membership of the mesh
///
/// Order is preserved from configuration so peer resolution is deterministic
/// for a given roster file. Read-only after construction.
#[derive(Clone, Debug)]
pub struct Roster {
    entries: Vec<Peer>,
}

impl Roster {
    /// Build a roster from entries, rejecting duplicate names
    pub fn new(entries: Vec<Peer>) -> Result<Self, MembershipError> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.name() == entry.name()) {
                return Err(MembershipError::DuplicateNode(entry.name().to_string()));
            }
        }
        Ok(Self { entries })
    }

    /// Number of nodes in the roster (including self)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the roster is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a node is part of the membership
    pub fn contains(&self, name: &NodeName) -> bool {
        self.entries.iter().any(|e| e.name() == name)
    }

    /// Iterate over all entries in roster order
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.entries.iter()
    }

    /// Resolve the peers of a node: every entry except the node itself
    ///
    /// Fails if the node is not in the roster (deployment misconfiguration)
    /// or if it would be alone in the mesh. Both are fatal for the caller.
    pub fn peers_of(&self, node: &NodeName) -> Result<Vec<Peer>, MembershipError> {
        if !self.contains(node) {
            return Err(MembershipError::UnknownNode(node.to_string()));
        }

        let peers: Vec<Peer> = self
            .entries
            .iter()
            .filter(|e| e.name() != node)
            .cloned()
            .collect();

        if peers.is_empty() {
            return Err(MembershipError::EmptyMembership);
        }
        Ok(peers)
    }
}
