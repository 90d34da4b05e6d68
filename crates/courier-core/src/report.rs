//! # Sync Reports
//!
//! [`SyncStats`] is accumulated while the hierarchy is walked; [`SyncReport`]
//! is what a finished run hands back to its caller.
//!
//! The report is binary: either the whole run succeeded, or it failed and the
//! counts are zero. Skipped cities and zones are tracked in the stats for
//! logging but never surface in the report.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::ProviderName;

/// Counters for a run in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records handed to the repository.
    pub processed_count: u64,
    /// Upsert calls made.
    pub batch_count: u64,
    /// Cities whose zone list could not be fetched.
    pub skipped_cities: u64,
    /// Zones whose area list could not be fetched.
    pub skipped_zones: u64,
}

impl SyncStats {
    /// Records one flushed batch of `size` records.
    pub fn record_batch(&mut self, size: usize) {
        self.processed_count += size as u64;
        self.batch_count += 1;
    }
}

/// Outcome of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub provider: ProviderName,
    pub success: bool,
    pub message: String,
    pub processed_count: u64,
    pub batch_count: u64,
}

impl SyncReport {
    /// Builds the report of a completed run.
    pub fn succeeded(run_id: Uuid, provider: ProviderName, stats: &SyncStats) -> Self {
        SyncReport {
            run_id,
            provider,
            success: true,
            message: format!(
                "Successfully stored {} {} records in {} batches",
                stats.processed_count, provider, stats.batch_count
            ),
            processed_count: stats.processed_count,
            batch_count: stats.batch_count,
        }
    }

    /// Builds the report of an aborted run. Partial counts are dropped.
    pub fn failed(run_id: Uuid, provider: ProviderName, reason: impl std::fmt::Display) -> Self {
        SyncReport {
            run_id,
            provider,
            success: false,
            message: format!("Failed to store {} courier data: {}", provider, reason),
            processed_count: 0,
            batch_count: 0,
        }
    }
}
