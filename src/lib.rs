// statusmesh - Status-report exchange across a fixed mesh of lab nodes
//
// Each node periodically produces a timestamped status artifact, delivers it
// to one or two randomly chosen peers over a secure copy channel, and keeps
// an append-only ledger of every transfer attempt. Delivery is fire-and-forget
// by design; visibility comes from the ledger and the read-only summaries.

pub mod artifact;
pub mod config;
pub mod exchange;
pub mod ledger;
pub mod membership;
pub mod transport;
