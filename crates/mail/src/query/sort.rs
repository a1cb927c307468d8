//! Message ordering

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{MailError, Result};
use crate::models::Message;

/// Field a result set is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    ReceivedDate,
    /// Case-sensitive, as stored
    Subject,
    /// Sender address
    Sender,
    /// Low < Normal < High
    Importance,
}

impl SortField {
    pub const VALID: &'static str = "received_date, subject, sender, importance";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReceivedDate => "received_date",
            Self::Subject => "subject",
            Self::Sender => "sender",
            Self::Importance => "importance",
        }
    }

    fn compare(&self, a: &Message, b: &Message) -> Ordering {
        match self {
            Self::ReceivedDate => a.received_at.cmp(&b.received_at),
            Self::Subject => a.subject.cmp(&b.subject),
            Self::Sender => a.from.email.cmp(&b.from.email),
            Self::Importance => a.importance.cmp(&b.importance),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "received_date" => Ok(Self::ReceivedDate),
            "subject" => Ok(Self::Subject),
            "sender" => Ok(Self::Sender),
            "importance" => Ok(Self::Importance),
            _ => Err(MailError::invalid_argument(format!(
                "Invalid sort field '{}'. Valid options are: {}",
                s,
                Self::VALID
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(MailError::invalid_argument(format!(
                "Invalid sort order '{}'. Valid options are: asc, desc",
                s
            ))),
        }
    }
}

/// Field plus direction; defaults to newest first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parse a field and direction given as strings
    pub fn parse(field: &str, direction: &str) -> Result<Self> {
        Ok(Self::new(field.parse()?, direction.parse()?))
    }
}

/// Return a sorted copy of `messages`
///
/// The sort is stable in both directions: equal keys keep their input
/// order.
pub fn sort_messages(messages: &[Message], order: SortOrder) -> Vec<Message> {
    let mut sorted = messages.to_vec();
    sort_in_place(&mut sorted, order);
    sorted
}

/// Sort an owned result set without copying it
pub fn sort_in_place(messages: &mut [Message], order: SortOrder) {
    let SortOrder { field, direction } = order;
    match direction {
        SortDirection::Asc => messages.sort_by(|a, b| field.compare(a, b)),
        SortDirection::Desc => messages.sort_by(|a, b| field.compare(b, a)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmailAddress, Importance};
    use chrono::{Duration, TimeZone, Utc};

    fn message(id: &str, subject: &str, sender: &str, hours_ago: i64, importance: Importance) -> Message {
        let anchor = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        Message::builder(id, "Inbox")
            .subject(subject)
            .from(EmailAddress::new(sender))
            .received_at(anchor - Duration::hours(hours_ago))
            .importance(importance)
            .build()
            .unwrap()
    }

    fn sample() -> Vec<Message> {
        vec![
            message("1", "Beta", "bob@x.com", 3, Importance::Normal),
            message("2", "Alpha", "carol@x.com", 1, Importance::Low),
            message("3", "gamma", "alice@x.com", 2, Importance::High),
            message("4", "Delta", "dave@x.com", 5, Importance::Normal),
        ]
    }

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_parse_field_and_direction() {
        assert_eq!("Subject".parse::<SortField>().unwrap(), SortField::Subject);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(SortOrder::default(), SortOrder::new(SortField::ReceivedDate, SortDirection::Desc));
    }

    #[test]
    fn test_invalid_field_and_direction() {
        let err = "size".parse::<SortField>().unwrap_err();
        assert!(matches!(err, MailError::InvalidArgument(_)));
        assert!(err.to_string().contains("'size'"));

        let err = SortOrder::parse("subject", "sideways").unwrap_err();
        assert!(matches!(err, MailError::InvalidArgument(_)));
    }

    #[test]
    fn test_subject_is_case_sensitive() {
        let sorted = sort_messages(&sample(), SortOrder::new(SortField::Subject, SortDirection::Asc));
        // Uppercase sorts before lowercase
        assert_eq!(ids(&sorted), vec!["2", "1", "4", "3"]);
    }

    #[test]
    fn test_received_date_desc() {
        let sorted = sort_messages(&sample(), SortOrder::default());
        assert_eq!(ids(&sorted), vec!["2", "3", "1", "4"]);
    }

    #[test]
    fn test_sender_sorts_by_address() {
        let sorted = sort_messages(&sample(), SortOrder::new(SortField::Sender, SortDirection::Asc));
        assert_eq!(ids(&sorted), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn test_importance_is_ordinal() {
        let desc = sort_messages(&sample(), SortOrder::new(SortField::Importance, SortDirection::Desc));
        assert_eq!(ids(&desc), vec!["3", "1", "4", "2"]);

        let asc = sort_messages(&sample(), SortOrder::new(SortField::Importance, SortDirection::Asc));
        assert_eq!(ids(&asc), vec!["2", "1", "4", "3"]);
    }

    #[test]
    fn test_stable_and_idempotent() {
        let order = SortOrder::new(SortField::Importance, SortDirection::Desc);
        let once = sort_messages(&sample(), order);
        let twice = sort_messages(&once, order);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_is_untouched() {
        let input = sample();
        let _ = sort_messages(&input, SortOrder::new(SortField::Subject, SortDirection::Desc));
        assert_eq!(ids(&input), vec!["1", "2", "3", "4"]);
    }
}
