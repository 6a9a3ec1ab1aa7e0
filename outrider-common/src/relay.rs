//! The relay (outbound mail server) descriptor.

use serde::{Deserialize, Serialize};

/// One entry from the `servers` collection: a relay the delivery client can
/// authenticate against and hand the message to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayDescriptor {
    pub id: String,
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}
