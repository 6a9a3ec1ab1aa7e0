//! The store gateway: atomic claim/finalize against the shared record queue.
//!
//! Plays the role `empath_spool::BackingStore` plays for `empath`: a trait
//! object so the worker pool and its tests are decoupled from the concrete
//! backend (Mongo in production, an in-memory map in tests).

pub mod error;
pub mod memory;
pub mod mongo;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use outrider_common::{Record, RelayDescriptor, UpdateIntent};

/// Atomic claim and finalize against the shared store, hiding connection
/// management from the worker loop.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Atomically claims one eligible record (`worker_id` is null, `status`
    /// is `incomplete`, and `updated_at` is older than the retry interval)
    /// and marks it owned by `worker_id`, returning the record as it exists
    /// after the update. Returns `Ok(None)` if no record is eligible; that
    /// is not an error.
    async fn claim_ready(
        &self,
        worker_id: &str,
        retry_interval: std::time::Duration,
    ) -> Result<Option<Record>>;

    /// Atomically applies `intent` to the record identified by `record_id`
    /// and releases the worker's claim (`worker_id = null`).
    async fn finalize(&self, record_id: &str, intent: &UpdateIntent) -> Result<()>;

    /// Returns one relay chosen uniformly at random from the registry.
    /// Fails with [`StoreError::NoServers`] if the registry is empty.
    async fn pick_relay(&self) -> Result<RelayDescriptor>;

    /// Releases underlying resources. Idempotent.
    async fn close(&self);
}
