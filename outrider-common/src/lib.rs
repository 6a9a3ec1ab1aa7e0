//! Shared types for the outrider outbound delivery worker pool.
//!
//! This crate plays the role `empath-common` plays for `empath`: the types
//! every other crate in the workspace depends on, plus the ambient logging
//! and configuration machinery.

pub mod config;
pub mod logging;
pub mod record;
pub mod relay;

pub use config::Config;
pub use record::{Record, RecordStatus, Recipient, RecipientKind};
pub use relay::RelayDescriptor;
pub use tracing;

/// Broadcast signal used to tell every worker to stop looping.
///
/// Mirrors `empath_common::Signal`: a single variant is all the supervisor
/// needs, but the enum leaves room for a future `Finalised` ack without
/// changing every call site.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}

/// The set of field changes a classifier produces for a single delivery
/// attempt, ready to be applied by the store gateway's `finalize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIntent {
    pub status: RecordStatus,
    pub reason: String,
    pub recipients: Vec<Recipient>,
    pub tries: u32,
}

impl UpdateIntent {
    /// Seed a working intent from a record's current state, the way the
    /// worker does before handing it to `classify`.
    #[must_use]
    pub fn seeded_from(record: &Record) -> Self {
        Self {
            status: record.status,
            reason: record.reason.clone(),
            recipients: record.recipients.clone(),
            tries: record.tries,
        }
    }
}
