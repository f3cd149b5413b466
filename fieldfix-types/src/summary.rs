use serde::{Deserialize, Serialize};

/// Per-run outcome tallies.
///
/// Every selected issue lands in exactly one bucket, so the buckets sum to
/// `selected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub selected: u64,
    pub failed_tests: u64,
    pub changed: u64,
    pub unchanged: u64,
    /// Missing replacement fields or a rejected update.
    pub failed: u64,
    /// Dry-run issues that had staged changes.
    pub would_change: u64,
}

impl RunSummary {
    pub fn accounted(&self) -> u64 {
        self.failed_tests + self.changed + self.unchanged + self.failed + self.would_change
    }
}
