// Status Report - The artifact produced once per exchange cycle
//
// A report is immutable once created. Its identity is the producing node plus
// the creation timestamp, and both are embedded in the filename so that
// concurrent deliveries from distinct senders never collide at a receiver.

use crate::membership::NodeName;
use chrono::{DateTime, Utc};

/// Timestamp format embedded in artifact filenames (second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extension for artifact files
const ARTIFACT_EXT: &str = ".txt";

/// A status report describing local node state at one point in time
#[derive(Clone, Debug)]
pub struct StatusReport {
    producer: NodeName,
    created_at: DateTime<Utc>,
    lines: Vec<String>,
}

impl StatusReport {
    /// Create a report for the given producer and creation time
    pub fn new(producer: NodeName, created_at: DateTime<Utc>) -> Self {
        Self {
            producer,
            created_at,
            lines: Vec::new(),
        }
    }

    /// Append a free-form detail line to the report body
    pub fn with_line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    /// Get the producing node
    pub fn producer(&self) -> &NodeName {
        &self.producer
    }

    /// Get the creation time
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Filename timestamp field for this report
    pub fn timestamp_field(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Name of this report in the producer's sent/ store
    pub fn file_name(&self) -> String {
        format!("status_{}_{}{}", self.producer, self.timestamp_field(), ARTIFACT_EXT)
    }

    /// Name of this report in a receiver's received/ store
    pub fn delivery_name(&self) -> String {
        format!("from_{}_{}{}", self.producer, self.timestamp_field(), ARTIFACT_EXT)
    }

    /// Render the report body
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("hostname: {}\n", self.producer));
        out.push_str(&format!(
            "generated: {}\n",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Sender and timestamp recovered from a received artifact's filename
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryInfo {
    pub sender: NodeName,
    pub timestamp: String,
}

/// Parse a `from_<sender>_<date>_<time>.txt` delivery name
///
/// Returns None for files that do not follow the scheme; the received store
/// tolerates foreign files, they just stay out of per-sender tallies.
pub fn parse_delivery_name(name: &str) -> Option<DeliveryInfo> {
    let stem = name.strip_prefix("from_")?.strip_suffix(ARTIFACT_EXT)?;
    let mut fields = stem.rsplitn(3, '_');
    let time = fields.next()?;
    let date = fields.next()?;
    let sender = fields.next()?;

    if date.len() != 8 || time.len() != 6 {
        return None;
    }
    if !date.chars().all(|c| c.is_ascii_digit()) || !time.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let sender = NodeName::new(sender).ok()?;
    Some(DeliveryInfo {
        sender,
        timestamp: format!("{}_{}", date, time),
    })
}
