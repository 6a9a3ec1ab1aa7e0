//! Pure message formatting: turns a [`Record`] into RFC-5322-ish bytes ready
//! to hand to the delivery client.

use outrider_common::{Record, RecipientKind};

use crate::error::FormatError;

/// Formats `record` into the header-plus-body byte sequence the relay
/// expects.
///
/// An `Unknown` recipient kind is a malformed record and produces
/// [`FormatError::InvalidRecipientKind`] rather than silently dropping the
/// recipient; the worker treats that as an immediate terminal failure
/// before any delivery attempt.
///
/// # Errors
/// Returns [`FormatError::InvalidRecipientKind`] if any recipient carries an
/// unrecognized kind.
pub fn format(record: &Record) -> Result<Vec<u8>, FormatError> {
    if record
        .recipients
        .iter()
        .any(|recipient| recipient.kind == RecipientKind::Unknown)
    {
        return Err(FormatError::InvalidRecipientKind);
    }

    let to = addresses_of(record, RecipientKind::To);
    let cc = addresses_of(record, RecipientKind::Cc);

    let mut out = Vec::new();
    out.extend_from_slice(format!("From: {}\r\n", record.sender).as_bytes());

    if !to.is_empty() {
        out.extend_from_slice(format!("To: {}\r\n", to.join(", ")).as_bytes());
    }
    if !cc.is_empty() {
        out.extend_from_slice(format!("Cc: {}\r\n", cc.join(", ")).as_bytes());
    }

    out.extend_from_slice(format!("Subject: {}\r\n", record.subject).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(record.body.as_bytes());

    Ok(out)
}

fn addresses_of(record: &Record, kind: RecipientKind) -> Vec<&str> {
    record
        .recipients
        .iter()
        .filter(|recipient| recipient.kind == kind)
        .map(|recipient| recipient.address.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use outrider_common::Recipient;

    use super::*;

    #[test]
    fn formats_headers_and_body_in_order() {
        let record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![
                Recipient::new("a@u.com", RecipientKind::To),
                Recipient::new("b@u.com", RecipientKind::Cc),
            ],
        );

        let bytes = format(&record).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "From: from@u.com\r\nTo: a@u.com\r\nCc: b@u.com\r\nSubject: S\r\n\r\nB"
        );
    }

    #[test]
    fn omits_header_for_kind_with_no_recipients() {
        let record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![Recipient::new("a@u.com", RecipientKind::To)],
        );

        let text = String::from_utf8(format(&record).unwrap()).unwrap();
        assert!(!text.contains("Cc:"));
    }

    #[test]
    fn bcc_never_appears_in_headers() {
        let record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![
                Recipient::new("a@u.com", RecipientKind::To),
                Recipient::new("hidden@u.com", RecipientKind::Bcc),
            ],
        );

        let text = String::from_utf8(format(&record).unwrap()).unwrap();
        assert!(!text.contains("Bcc:"));
        assert!(!text.contains("hidden@u.com"));
    }

    #[test]
    fn joins_multiple_addresses_of_the_same_kind() {
        let record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![
                Recipient::new("a@u.com", RecipientKind::To),
                Recipient::new("c@u.com", RecipientKind::To),
            ],
        );

        let text = String::from_utf8(format(&record).unwrap()).unwrap();
        assert!(text.contains("To: a@u.com, c@u.com\r\n"));
    }

    #[test]
    fn unknown_recipient_kind_is_a_format_error() {
        let record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![Recipient::new("a@u.com", RecipientKind::Unknown)],
        );

        assert_eq!(format(&record), Err(FormatError::InvalidRecipientKind));
    }
}
