// Artifact module - STATUS REPORTS AND THEIR STORES
// Handles report rendering, the filename scheme, and the per-node
// directory layout backing the sent/ and received/ stores

mod report;
mod store;

pub use report::{parse_delivery_name, DeliveryInfo, StatusReport, TIMESTAMP_FORMAT};
pub use store::{
    ExchangeLayout, ExchangeSnapshot, ReceivedStore, SentStore, StoreError, StoredArtifact,
};
