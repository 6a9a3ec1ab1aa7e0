//! In-memory [`StoreGateway`], grounded on
//! `empath_spool::backends::memory::MemoryBackingStore`: a `HashMap`
//! protected by a lock, intended for tests and local development rather
//! than production use.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bson::DateTime as BsonDateTime;
use outrider_common::{Record, RecordStatus, RelayDescriptor, UpdateIntent};
use rand::seq::SliceRandom;

use crate::error::{Result, StoreError};

/// An in-memory `StoreGateway`.
///
/// Claims are linearized through a single `Mutex`, which gives the same
/// "no two callers receive the same record" guarantee the spec requires of
/// the real gateway without needing a database for tests (spec invariant
/// I1 / scenario X1).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, Record>>>,
    relays: Arc<Mutex<Vec<RelayDescriptor>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a record, as a test fixture would.
    pub fn insert_record(&self, record: Record) {
        self.records.lock().unwrap().insert(record.id.clone(), record);
    }

    /// Seeds the store with a relay, as a test fixture would.
    pub fn insert_relay(&self, relay: RelayDescriptor) {
        self.relays.lock().unwrap().push(relay);
    }

    /// Reads back the current state of a record, for test assertions.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Record> {
        self.records.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl crate::StoreGateway for MemoryStore {
    async fn claim_ready(
        &self,
        worker_id: &str,
        retry_interval: Duration,
    ) -> Result<Option<Record>> {
        let mut records = self.records.lock().unwrap();
        let cutoff = BsonDateTime::from_millis(
            BsonDateTime::now().timestamp_millis() - retry_interval.as_millis() as i64,
        );

        let eligible = records.values_mut().find(|record| {
            record.worker_id.is_none()
                && record.status == RecordStatus::Incomplete
                && record.updated_at < cutoff
        });

        let Some(record) = eligible else {
            return Ok(None);
        };

        record.worker_id = Some(worker_id.to_string());
        Ok(Some(record.clone()))
    }

    async fn finalize(&self, record_id: &str, intent: &UpdateIntent) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.get_mut(record_id) else {
            return Err(StoreError::NotFound(record_id.to_string()));
        };

        record.worker_id = None;
        record.tries = intent.tries;
        record.status = intent.status;
        record.reason = intent.reason.clone();
        record.recipients = intent.recipients.clone();
        record.updated_at = BsonDateTime::now();

        Ok(())
    }

    async fn pick_relay(&self) -> Result<RelayDescriptor> {
        let relays = self.relays.lock().unwrap();
        relays
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(StoreError::NoServers)
    }

    async fn close(&self) {}
}
