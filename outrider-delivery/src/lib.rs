//! Message formatting, outbound SMTP delivery, and outcome classification.
//!
//! Plays the role `empath-delivery` plays in the teacher workspace, minus
//! its MX/DNS resolution: delivery here always targets a relay handed down
//! by the store gateway's `pick_relay`.

pub mod classifier;
pub mod client;
pub mod error;
pub mod formatter;

pub use classifier::{classify, malformed_record_intent};
pub use client::{DeliveryClient, SmtpDeliveryClient};
pub use error::{DeliveryError, FormatError};
pub use formatter::format;
