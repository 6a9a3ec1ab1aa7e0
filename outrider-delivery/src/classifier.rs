//! Pure outcome classification: turns a delivery attempt's result into the
//! [`UpdateIntent`] the store gateway's `finalize` will apply.

use outrider_common::{Record, RecordStatus, UpdateIntent};

const INVALID_RECIPIENT_PREFIX: &str = "550 Invalid Recipient";
const UNRECOGNISED_COMMAND_PREFIX: &str = "500 Unrecognised command";
const EOF_PREFIX: &str = "EOF";

const INVALID_RECIPIENT_REASON: &str = "invalid-recipient";
const UNRECOGNIZED_COMMAND_REASON: &str = "unrecognized-command";
const EOF_REASON: &str = "eof";
const UNCLASSIFIED_REASON: &str = "unclassified-error";
const MALFORMED_RECORD_REASON: &str = "malformed-record";

/// Case-insensitively matches `text` against `prefix` and returns whatever
/// follows, or `None` if `text` doesn't start with `prefix`.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() < prefix.len() {
        return None;
    }
    let (head, tail) = text.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(tail)
}

/// Extracts the offending address from an "Invalid Recipient" error: the
/// substring following the prefix and one separator character, or the
/// empty string if the error text was exactly the prefix.
fn offending_address(tail: &str) -> String {
    if tail.is_empty() {
        return String::new();
    }
    // Skip exactly one separator character (":", " ", etc.) after the prefix.
    tail.char_indices()
        .nth(1)
        .map_or(String::new(), |(idx, _)| tail[idx..].to_string())
}

/// Produces the update intent from a single delivery attempt.
///
/// `err` is the relay's raw error text on failure, or `None` on success.
/// `send_retries` is the configured retry budget (`cfg.send_retries`).
#[must_use]
pub fn classify(err: Option<&str>, record: &Record, send_retries: u32) -> UpdateIntent {
    let mut intent = UpdateIntent::seeded_from(record);

    let Some(err) = err else {
        intent.status = RecordStatus::Complete;
        intent.reason.clear();
        for recipient in &mut intent.recipients {
            recipient.reason = "ok".to_string();
        }
        return intent;
    };

    if let Some(tail) = strip_prefix_ci(err, INVALID_RECIPIENT_PREFIX) {
        let offending = offending_address(tail);
        for recipient in &mut intent.recipients {
            if recipient.address == offending {
                recipient.status = 550;
                recipient.reason = INVALID_RECIPIENT_PREFIX.to_string();
            }
        }
        intent.status = RecordStatus::Failed;
        intent.reason = INVALID_RECIPIENT_REASON.to_string();
        return intent;
    }

    if strip_prefix_ci(err, UNRECOGNISED_COMMAND_PREFIX).is_some() {
        intent.status = RecordStatus::Incomplete;
        intent.reason = UNRECOGNIZED_COMMAND_REASON.to_string();
    } else if strip_prefix_ci(err, EOF_PREFIX).is_some() {
        intent.status = RecordStatus::Incomplete;
        intent.reason = EOF_REASON.to_string();
    } else {
        // Open Question (spec §9) resolved: treat unclassified errors as
        // retryable, subject to the same tries/exhaustion rule below.
        intent.status = RecordStatus::Incomplete;
        intent.reason = UNCLASSIFIED_REASON.to_string();
    }

    if intent.status == RecordStatus::Incomplete {
        intent.tries += 1;
        if intent.tries >= send_retries {
            intent.status = RecordStatus::Failed;
        }
    }

    intent
}

/// Builds the intent for a record that failed formatting before any
/// delivery attempt was made (spec §4.2/§4.5): an immediate terminal
/// failure that bypasses `classify` entirely.
#[must_use]
pub fn malformed_record_intent(record: &Record) -> UpdateIntent {
    let mut intent = UpdateIntent::seeded_from(record);
    intent.status = RecordStatus::Failed;
    intent.reason = MALFORMED_RECORD_REASON.to_string();
    intent
}

#[cfg(test)]
mod tests {
    use outrider_common::{Recipient, RecipientKind};

    use super::*;

    fn record_with_tries(tries: u32) -> Record {
        let mut record = Record::new(
            "rec-1",
            "from@u.com",
            "S",
            "B",
            vec![
                Recipient::new("a@u.com", RecipientKind::To),
                Recipient::new("b@u.com", RecipientKind::Cc),
            ],
        );
        record.tries = tries;
        record
    }

    #[test]
    fn success_completes_and_marks_every_recipient_ok() {
        let record = record_with_tries(0);
        let intent = classify(None, &record, 3);

        assert_eq!(intent.status, RecordStatus::Complete);
        assert!(intent.reason.is_empty());
        assert!(intent.recipients.iter().all(|r| r.reason == "ok"));
        assert_eq!(intent.tries, 0);
    }

    #[test]
    fn invalid_recipient_marks_offending_address_and_is_terminal() {
        let record = record_with_tries(0);
        let intent = classify(Some("550 Invalid Recipient: a@u.com"), &record, 3);

        assert_eq!(intent.status, RecordStatus::Failed);
        assert_eq!(intent.reason, "invalid-recipient");
        assert_eq!(intent.tries, 0, "tries unchanged for invalid recipient");

        let offending = intent
            .recipients
            .iter()
            .find(|r| r.address == "a@u.com")
            .unwrap();
        assert_eq!(offending.status, 550);
        assert_eq!(offending.reason, "550 Invalid Recipient");

        let other = intent
            .recipients
            .iter()
            .find(|r| r.address == "b@u.com")
            .unwrap();
        assert_eq!(other.status, 0);
    }

    #[test]
    fn invalid_recipient_with_exact_prefix_length_yields_empty_address() {
        let record = record_with_tries(0);
        let intent = classify(Some("550 Invalid Recipient"), &record, 3);

        assert_eq!(intent.status, RecordStatus::Failed);
        // No recipient has an empty address, so none get marked, but the
        // record is still terminally failed.
        assert!(intent.recipients.iter().all(|r| r.status == 0));
    }

    #[test]
    fn unrecognised_command_increments_tries_and_stays_incomplete() {
        // S3: tries 0 -> 1, stays incomplete (send_retries = 3).
        let record = record_with_tries(0);
        let intent = classify(Some("500 Unrecognised command"), &record, 3);

        assert_eq!(intent.status, RecordStatus::Incomplete);
        assert_eq!(intent.reason, "unrecognized-command");
        assert_eq!(intent.tries, 1);
    }

    #[test]
    fn eof_increments_tries_and_stays_incomplete() {
        let record = record_with_tries(0);
        let intent = classify(Some("EOF"), &record, 3);

        assert_eq!(intent.status, RecordStatus::Incomplete);
        assert_eq!(intent.reason, "eof");
        assert_eq!(intent.tries, 1);
    }

    #[test]
    fn retry_exhaustion_upgrades_to_failed() {
        // S5: tries 2 -> 3, upgrades to failed since send_retries = 3.
        let record = record_with_tries(2);
        let intent = classify(Some("EOF"), &record, 3);

        assert_eq!(intent.status, RecordStatus::Failed);
        assert_eq!(intent.reason, "eof");
        assert_eq!(intent.tries, 3);
    }

    #[test]
    fn unclassified_error_is_treated_as_retryable() {
        let record = record_with_tries(0);
        let intent = classify(Some("421 Service not available"), &record, 3);

        assert_eq!(intent.status, RecordStatus::Incomplete);
        assert_eq!(intent.reason, "unclassified-error");
        assert_eq!(intent.tries, 1);
    }

    #[test]
    fn prefix_matching_is_case_insensitive() {
        let record = record_with_tries(0);
        let intent = classify(Some("eof"), &record, 3);
        assert_eq!(intent.reason, "eof");
    }

    #[test]
    fn malformed_record_intent_is_terminal_without_classifying() {
        let record = record_with_tries(0);
        let intent = malformed_record_intent(&record);

        assert_eq!(intent.status, RecordStatus::Failed);
        assert_eq!(intent.reason, "malformed-record");
        assert_eq!(intent.tries, 0);
    }
}
