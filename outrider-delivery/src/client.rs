//! The delivery client: hands a formatted message to a relay over SMTP.

use async_trait::async_trait;
use mail_send::smtp::message::Message as SmtpMessage;
use mail_send::SmtpClientBuilder;
use outrider_common::{delivery, Record, RelayDescriptor};

use crate::error::DeliveryError;

/// Sends a formatted record to a relay.
///
/// A trait so tests can swap in a mock, the way `empath-delivery`'s own
/// `DeliveryQueryService` decouples its processor from a concrete transport.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Builds the envelope from every recipient (to, cc, bcc), authenticates
    /// against `relay`, and transmits `message`. The relay's error text is
    /// preserved verbatim in the returned error.
    async fn send(&self, relay: &RelayDescriptor, record: &Record, message: &[u8]) -> Result<(), DeliveryError>;
}

/// A `DeliveryClient` backed by the `mail-send` crate, authenticating with
/// plain credentials against an arbitrary relay host:port (grounded on
/// `remails`'s use of `SmtpClientBuilder` in its own delivery path, since
/// `empath-smtp` is coupled to MX resolution rather than a fixed relay).
///
/// The envelope is sent as a raw `mail_send::smtp::message::Message`
/// (mail_from/rcpt_to/body) rather than through `mail_builder::MessageBuilder`,
/// the way `remails`' own `IntoMessage` impl for its pre-formatted messages
/// does (`models/message.rs`): the body here was already rendered by
/// `outrider_delivery::formatter::format`, so nothing should regenerate
/// headers from the recipient list.
#[derive(Debug, Default)]
pub struct SmtpDeliveryClient;

impl SmtpDeliveryClient {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryClient for SmtpDeliveryClient {
    async fn send(&self, relay: &RelayDescriptor, record: &Record, message: &[u8]) -> Result<(), DeliveryError> {
        let mut client = SmtpClientBuilder::new(relay.hostname.as_str(), relay.port)
            .implicit_tls(false)
            .credentials((relay.username.as_str(), relay.password.as_str()))
            .connect()
            .await
            .map_err(|err| {
                delivery!(level = WARN, "could not connect to relay {}:{}: {err}", relay.hostname, relay.port);
                DeliveryError::Connect {
                    host: relay.hostname.clone(),
                    port: relay.port,
                    source: Box::new(err),
                }
            })?;

        // The envelope carries every recipient (to, cc, bcc); the formatted
        // `message` bytes already have the headers the formatter chose to
        // write, so the envelope here must not be rebuilt through anything
        // that would generate its own headers from `to`/`cc` and duplicate
        // or, worse, leak a `bcc` address into them.
        let rcpt_to: Vec<_> = record
            .recipients
            .iter()
            .map(|recipient| recipient.address.clone().into())
            .collect();

        let envelope = SmtpMessage {
            mail_from: record.sender.clone().into(),
            rcpt_to,
            body: message.to_vec().into(),
        };

        client
            .send(envelope)
            .await
            .map_err(|err| DeliveryError::Rejected(err.to_string()))
    }
}
