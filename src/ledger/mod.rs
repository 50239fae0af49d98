// Ledger module - THE AUDIT TRAIL
// Append-only transfer history and the read-only received-store summary

mod history;
mod summary;

pub use history::{
    ExchangeAction, HistoryLedger, LedgerError, TransferRecord, TransferStatus, HISTORY_HEADER,
};
pub use summary::{summarize, ReceivedEntry, ReceivedSummary};
