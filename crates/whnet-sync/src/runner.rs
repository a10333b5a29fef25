//! Background synchronization runner.
//!
//! Polls the claim queue, pushes each claimed warehouse to the external
//! system, and reports the outcome back into the store. Safe to run in any
//! number of instances: the queue guarantees disjoint claims.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use whnet_core::WarehouseId;

use crate::error::SyncError;
use crate::gateway::MasterDataGateway;
use crate::queue::SyncQueue;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct SyncRunnerConfig {
    /// How long to sleep when the queue has nothing free to claim, or after
    /// a failed iteration.
    pub poll_interval: Duration,
}

impl Default for SyncRunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Outcome of a single queue poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A warehouse was claimed, pushed, and marked synchronized.
    Synchronized(WarehouseId),
    /// Nothing was free to claim.
    Empty,
}

/// Background runner pushing pending warehouses to the external system.
pub struct SyncRunner<G> {
    queue: SyncQueue,
    gateway: Arc<G>,
    config: SyncRunnerConfig,
}

impl<G: MasterDataGateway + 'static> SyncRunner<G> {
    /// Create a new runner.
    #[must_use]
    pub fn new(queue: SyncQueue, gateway: Arc<G>, config: SyncRunnerConfig) -> Self {
        Self {
            queue,
            gateway,
            config,
        }
    }

    /// Claim one pending warehouse and push it.
    ///
    /// A failed push releases the claim before surfacing the error, so the
    /// row stays pending and is eligible for any claimant's next call. No
    /// retry happens within the claim.
    pub async fn sync_once(&self) -> Result<SyncOutcome, SyncError> {
        let Some(claim) = self.queue.try_claim_next().await? else {
            return Ok(SyncOutcome::Empty);
        };

        let warehouse_id = claim.warehouse().warehouse_id;
        let prior_state = claim.prior_state();

        match self.gateway.push(claim.warehouse()).await {
            Ok(goodzon_id) => {
                claim.complete(goodzon_id).await?;
                info!(
                    warehouse_id = %warehouse_id,
                    ?prior_state,
                    goodzon_id,
                    "Warehouse synchronized"
                );
                Ok(SyncOutcome::Synchronized(warehouse_id))
            }
            Err(e) => {
                claim.release().await?;
                Err(SyncError::Gateway(e))
            }
        }
    }

    /// Run the synchronization loop. Blocks until the cancel signal flips
    /// to `true`; spawn it via `tokio::spawn`.
    ///
    /// After a successful push the loop immediately tries the next row; an
    /// empty claim or a failure sleeps for the poll interval first.
    pub async fn run(self: Arc<Self>, cancel: tokio::sync::watch::Receiver<bool>) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "SyncRunner started"
        );

        loop {
            if *cancel.borrow() {
                info!("SyncRunner received cancel signal, shutting down");
                break;
            }

            match self.sync_once().await {
                Ok(SyncOutcome::Synchronized(_)) => {
                    // Pushed one, immediately look for the next.
                    continue;
                }
                Ok(SyncOutcome::Empty) => {
                    // Queue empty or fully contended.
                }
                Err(e) => {
                    error!(error = %e, "Synchronization iteration failed");
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
