//! Error types for the outrider-delivery crate.

use thiserror::Error;

/// Errors the message formatter can return.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// A recipient carried a kind the formatter doesn't recognize.
    ///
    /// The worker treats this as an immediate terminal failure and never
    /// hands the record to the delivery client.
    #[error("record has a recipient with an unrecognized kind")]
    InvalidRecipientKind,
}

/// Errors the delivery client can return.
///
/// The relay's raw error text is always preserved verbatim in `Rejected` so
/// the classifier can pattern-match on it, mirroring spec §4.3's
/// requirement that the protocol's error string survive unmodified.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The relay rejected the message or a connection-level protocol error
    /// occurred; `0` is the verbatim error text from the relay or client.
    #[error("{0}")]
    Rejected(String),

    /// The connection to the relay could not be established at all.
    #[error("could not connect to relay {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DeliveryError {
    /// The raw error text the classifier matches against.
    ///
    /// For a `Connect` failure this is the error's `Display` form, which
    /// for `mail-send`'s connection errors typically still carries an
    /// "EOF"-style string when the relay dropped the connection outright.
    #[must_use]
    pub fn classifier_text(&self) -> String {
        match self {
            Self::Rejected(text) => text.clone(),
            Self::Connect { source, .. } => source.to_string(),
        }
    }
}
