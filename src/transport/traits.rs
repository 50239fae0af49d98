// Transport Trait and Core Types
// Defines the abstract SecureTransport trait shared by all implementations
//
// The exchange model is deliberately fire-and-forget: one attempt per target
// per cycle, no retries. A retry policy, if ever wanted, belongs in a separate
// layer wrapping this trait, not inside an implementation.

use crate::membership::Peer;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from a single transfer attempt
///
/// All of these are isolated per target: a failed transfer is recorded and
/// the cycle proceeds to the next target.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Failed to launch transfer command: {0}")]
    SpawnFailed(String),

    #[error("Transfer rejected: {0}")]
    Rejected(String),

    #[error("Transfer timed out")]
    Timeout,

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),
}

/// Abstract point-to-point secure copy capability
///
/// Key exchange, authentication, and encryption are the implementation's
/// concern (or the platform's); callers see only success or failure.
#[async_trait]
pub trait SecureTransport: Send + Sync {
    /// Deliver a local file into the peer's received store under `dest_name`
    ///
    /// Blocks until the transfer completes, fails, or times out.
    async fn deliver(
        &self,
        peer: &Peer,
        source: &Path,
        dest_name: &str,
    ) -> Result<(), TransportError>;

    /// Short name of this transport, for logging
    fn name(&self) -> &'static str;
}
