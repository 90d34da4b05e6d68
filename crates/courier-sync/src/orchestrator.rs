//! # Sync Orchestrator
//!
//! Walks a provider's city → zone → area hierarchy and persists every area as
//! a flat location record.
//!
//! ## Walk
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              run()                                      │
//! │                                                                         │
//! │  token   = CredentialManager::get_valid_access_token()   ✗ → abort     │
//! │  cities  = list_cities()                                 ✗ → abort     │
//! │                                                                         │
//! │  for city in cities                                                    │
//! │      zones = list_zones(city)                            ✗ → skip city │
//! │      for chunk in zones.chunks(10)                                     │
//! │          for zone in chunk                                             │
//! │              areas = list_areas(zone)                    ✗ → skip zone │
//! │              for area in areas                                         │
//! │                  buffer.push(record) ── full (50)? ──► upsert_batch    │
//! │          buffer.take() ── anything left? ──► upsert_batch              │
//! │                                                                         │
//! │  any upsert failure                                       ✗ → abort     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed run reports zero counts even if some batches were committed.

use async_trait::async_trait;
use chrono::Utc;
use courier_core::{
    BatchBuffer, LocationRecord, SyncReport, SyncStats, DEFAULT_BATCH_SIZE,
    DEFAULT_ZONE_CHUNK_SIZE,
};
use courier_db::LocationRepository;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::CatalogClient;
use crate::credentials::CredentialManager;
use crate::error::{SyncError, SyncResult};
use crate::http::HttpTransport;
use crate::provider::ProviderEndpoints;

// =============================================================================
// Location Sink
// =============================================================================

/// Destination of flushed batches.
#[async_trait]
pub trait LocationSink: Send + Sync {
    /// Persists a batch atomically.
    async fn upsert_batch(&self, records: &[LocationRecord]) -> SyncResult<u64>;
}

#[async_trait]
impl LocationSink for LocationRepository {
    async fn upsert_batch(&self, records: &[LocationRecord]) -> SyncResult<u64> {
        Ok(LocationRepository::upsert_batch(self, records).await?)
    }
}

// =============================================================================
// Options
// =============================================================================

/// Batch sizing for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub batch_size: usize,
    pub zone_chunk_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            zone_chunk_size: DEFAULT_ZONE_CHUNK_SIZE,
        }
    }
}

impl SyncOptions {
    pub fn validate(&self) -> SyncResult<()> {
        if self.batch_size == 0 || self.zone_chunk_size == 0 {
            return Err(SyncError::InvalidConfig(
                "batch_size and zone_chunk_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs full-hierarchy syncs for one provider.
pub struct SyncOrchestrator {
    endpoints: ProviderEndpoints,
    credentials: Arc<CredentialManager>,
    transport: Arc<dyn HttpTransport>,
    sink: Arc<dyn LocationSink>,
    options: SyncOptions,
}

impl SyncOrchestrator {
    pub fn new(
        endpoints: ProviderEndpoints,
        credentials: Arc<CredentialManager>,
        transport: Arc<dyn HttpTransport>,
        sink: Arc<dyn LocationSink>,
        options: SyncOptions,
    ) -> Self {
        Self {
            endpoints,
            credentials,
            transport,
            sink,
            options,
        }
    }

    /// Runs one sync and reports its outcome. Never returns an error; every
    /// failure is folded into an unsuccessful report.
    pub async fn run(&self) -> SyncReport {
        let run_id = Uuid::new_v4();
        let provider = self.endpoints.provider();
        let span = info_span!("sync_run", %run_id, %provider);

        async move {
            info!(
                batch_size = self.options.batch_size,
                zone_chunk_size = self.options.zone_chunk_size,
                "Starting courier location sync"
            );

            match self.walk().await {
                Ok(stats) => {
                    info!(
                        processed = stats.processed_count,
                        batches = stats.batch_count,
                        skipped_cities = stats.skipped_cities,
                        skipped_zones = stats.skipped_zones,
                        "Courier location sync finished"
                    );
                    SyncReport::succeeded(run_id, provider, &stats)
                }
                Err(e) => {
                    error!(error = %e, "Error storing {} courier data", provider);
                    SyncReport::failed(run_id, provider, e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn walk(&self) -> SyncResult<SyncStats> {
        self.options.validate()?;

        let token = self.credentials.get_valid_access_token().await?;
        let client = CatalogClient::new(self.endpoints.clone(), self.transport.clone(), token);
        let provider = self.endpoints.provider();

        let cities = client.list_cities().await?;
        info!(cities = cities.len(), "Fetched city list");

        let mut stats = SyncStats::default();
        let mut buffer = BatchBuffer::new(self.options.batch_size)?;

        for city in &cities {
            let zones = match client.list_zones(city.city_id).await {
                Ok(zones) => zones,
                Err(e) if e.is_recoverable_fetch() => {
                    warn!(city_id = city.city_id, error = %e, "Failed to fetch zones for city");
                    stats.skipped_cities += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            for chunk in zones.chunks(self.options.zone_chunk_size) {
                for zone in chunk {
                    let areas = match client.list_areas(zone.zone_id).await {
                        Ok(areas) => areas,
                        Err(e) if e.is_recoverable_fetch() => {
                            warn!(
                                city_id = city.city_id,
                                zone_id = zone.zone_id,
                                error = %e,
                                "Failed to fetch areas for zone"
                            );
                            stats.skipped_zones += 1;
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let now = Utc::now();
                    for area in &areas {
                        let record = LocationRecord::from_hierarchy(provider, city, zone, area, now);
                        if let Some(batch) = buffer.push(record) {
                            self.flush(&batch, &mut stats).await?;
                        }
                    }
                }

                if let Some(batch) = buffer.take() {
                    self.flush(&batch, &mut stats).await?;
                }
            }
        }

        Ok(stats)
    }

    async fn flush(&self, batch: &[LocationRecord], stats: &mut SyncStats) -> SyncResult<()> {
        self.sink.upsert_batch(batch).await?;
        stats.record_batch(batch.len());
        debug!(
            batch_size = batch.len(),
            processed = stats.processed_count,
            batches = stats.batch_count,
            "Flushed batch"
        );
        Ok(())
    }
}
