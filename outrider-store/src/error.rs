//! Error types for the outrider-store crate.

use thiserror::Error;

/// Errors a [`crate::StoreGateway`] can return.
///
/// Mirrors the shape of `empath_spool::error::SpoolError`: one enum,
/// distinguishing connectivity exhaustion from ordinary "not found" and
/// opaque driver failures, rather than letting the Mongo driver's own error
/// type leak past the gateway boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The dial/redial budget was exhausted without establishing a healthy
    /// session.
    #[error("could not connect to store after {retries} attempt(s): {source}")]
    Connection {
        retries: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `pick_relay` found the relay registry empty.
    #[error("no relays configured")]
    NoServers,

    /// The requested record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// An opaque failure from the underlying driver, once a session was
    /// established.
    #[error("store backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, StoreError>;
