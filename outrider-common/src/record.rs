//! The queued email record and its recipients.

use bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a queued record.
///
/// `Incomplete` records are eligible for claim (subject to the visibility
/// window); `Complete` and `Failed` are terminal and are never claimed
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Incomplete,
    Complete,
    Failed,
}

/// The kind of a recipient.
///
/// This is a closed enumeration in spirit, but carries an `Unknown` escape
/// hatch so a malformed value read back from the store can be represented
/// instead of failing deserialization outright — the formatter is what
/// turns an `Unknown` kind into a validation error (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    To,
    Cc,
    Bcc,
    #[serde(other)]
    Unknown,
}

/// A single recipient and the outcome of the most recent delivery attempt
/// against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub kind: RecipientKind,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub reason: String,
}

impl Recipient {
    #[must_use]
    pub fn new(address: impl Into<String>, kind: RecipientKind) -> Self {
        Self {
            address: address.into(),
            kind,
            status: 0,
            reason: String::new(),
        }
    }
}

/// A queued email awaiting or undergoing delivery.
///
/// `id` doubles as the Mongo `_id` field, matching the original datastore's
/// use of an opaque string identity rather than an `ObjectId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: String,
    pub subject: String,
    pub body: String,
    pub sender: String,
    pub recipients: Vec<Recipient>,
    pub status: RecordStatus,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub tries: u32,
    pub worker_id: Option<String>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl Record {
    /// Construct a freshly-ingested record: `incomplete`, zero tries, no
    /// owning worker. Exposed mainly for tests and for seeding the
    /// in-memory store.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: Vec<Recipient>,
    ) -> Self {
        let now = BsonDateTime::now();
        Self {
            id: id.into(),
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            recipients,
            status: RecordStatus::Incomplete,
            reason: String::new(),
            tries: 0,
            worker_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
