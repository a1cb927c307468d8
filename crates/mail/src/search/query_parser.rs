//! Query string parser for `find --query`
//!
//! Parses search queries with operators like:
//! - `from:alice@company.com` - sender filter
//! - `subject:meeting` - keyword filter
//! - `in:"Sent Items"`, `in:all` - folder scope
//! - `is:unread`, `is:read` - read-state filter
//! - `has:attachment`, `has:noattachment` - attachment filter
//! - `importance:high` - importance filter
//! - `before:2024/12/01`, `after:7d` - date filters

use chrono::{DateTime, Utc};

use super::dates::parse_date_expression;
use super::{FolderScope, SearchFilters};
use crate::error::Result;

const OPERATORS: [&str; 8] = [
    "from",
    "subject",
    "in",
    "is",
    "has",
    "importance",
    "before",
    "after",
];

/// Parsed query with structured components
///
/// Date and importance values are kept raw until [`ParsedQuery::to_filters`]
/// so that an invalid value is reported instead of dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    /// Free-text search terms
    pub terms: Vec<String>,
    /// from: filter values
    pub from: Vec<String>,
    /// subject: filter values
    pub subject: Vec<String>,
    /// in: folder path or `all`
    pub folder: Option<String>,
    /// is:unread / is:read
    pub is_unread: Option<bool>,
    /// has:attachment / has:noattachment
    pub has_attachment: Option<bool>,
    pub importance: Option<String>,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl ParsedQuery {
    /// Check if the query is empty (no terms or filters)
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
            && self.from.is_empty()
            && self.subject.is_empty()
            && self.folder.is_none()
            && self.is_unread.is_none()
            && self.has_attachment.is_none()
            && self.importance.is_none()
            && self.before.is_none()
            && self.after.is_none()
    }

    /// Folder scope named by `in:`, if any
    pub fn scope(&self) -> Option<FolderScope> {
        self.folder.as_deref().map(FolderScope::from)
    }

    /// Convert into search filters, resolving dates against `now`
    ///
    /// Free-text terms and `subject:` values all become keywords. With
    /// several `from:` values the last one wins.
    pub fn to_filters(&self, now: DateTime<Utc>) -> Result<SearchFilters> {
        let mut filters = SearchFilters {
            keywords: self.terms.iter().chain(&self.subject).cloned().collect(),
            sender: self.from.last().cloned(),
            is_unread: self.is_unread,
            has_attachments: self.has_attachment,
            ..SearchFilters::default()
        };
        if let Some(level) = &self.importance {
            filters.importance = Some(level.parse()?);
        }
        if let Some(after) = &self.after {
            filters.since = Some(parse_date_expression(after, now)?);
        }
        if let Some(before) = &self.before {
            filters.until = Some(parse_date_expression(before, now)?);
        }
        Ok(filters)
    }
}

/// Parse a search query string into structured components
///
/// Everything that is not a known operator with a non-empty value is
/// treated as a free-text term.
pub fn parse_query(input: &str) -> ParsedQuery {
    let mut query = ParsedQuery::default();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if let Some((key, value, consumed)) = parse_operator(rest) {
            match key.as_str() {
                "from" => query.from.push(value),
                "subject" => query.subject.push(value),
                "in" => query.folder = Some(value),
                "is" => match value.to_lowercase().as_str() {
                    "unread" => query.is_unread = Some(true),
                    "read" => query.is_unread = Some(false),
                    _ => query.terms.push(format!("is:{}", value)),
                },
                "has" => match value.to_lowercase().as_str() {
                    "attachment" | "attachments" => query.has_attachment = Some(true),
                    "noattachment" | "noattachments" => query.has_attachment = Some(false),
                    _ => query.terms.push(format!("has:{}", value)),
                },
                "importance" => query.importance = Some(value),
                "before" => query.before = Some(value),
                "after" => query.after = Some(value),
                _ => query.terms.push(format!("{}:{}", key, value)),
            }
            rest = &rest[consumed..];
        } else {
            let (word, consumed) = parse_value(rest);
            if !word.is_empty() {
                query.terms.push(word);
            }
            rest = &rest[consumed..];
        }
    }

    query
}

/// Parse an operator like "from:value" or "from:\"quoted value\""
///
/// Returns the lowercased key, the value and the bytes consumed.
fn parse_operator(input: &str) -> Option<(String, String, usize)> {
    let colon_pos = input.find(':')?;
    let key = &input[..colon_pos];

    if key.chars().any(char::is_whitespace) {
        return None;
    }
    let key = key.to_lowercase();
    if !OPERATORS.contains(&key.as_str()) {
        return None;
    }

    let (value, value_len) = parse_value(&input[colon_pos + 1..]);
    if value.is_empty() {
        return None;
    }

    Some((key, value, colon_pos + 1 + value_len))
}

/// Parse a value or word, quoted or unquoted
///
/// Returns the value and the bytes consumed, including closing quote.
fn parse_value(input: &str) -> (String, usize) {
    if let Some(quoted) = input.strip_prefix('"') {
        return match quoted.find('"') {
            Some(end) => (quoted[..end].to_string(), end + 2),
            None => (quoted.to_string(), input.len()),
        };
    }

    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    (input[..end].to_string(), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;
    use crate::models::Importance;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_simple_query() {
        let query = parse_query("hello world");
        assert_eq!(query.terms, vec!["hello", "world"]);
        assert!(query.from.is_empty());
    }

    #[test]
    fn test_parse_quoted_phrase() {
        let query = parse_query("\"hello world\" again");
        assert_eq!(query.terms, vec!["hello world", "again"]);
    }

    #[test]
    fn test_parse_quoted_operator_value() {
        let query = parse_query("from:\"John Doe\" in:\"Sent Items\"");
        assert_eq!(query.from, vec!["John Doe"]);
        assert_eq!(query.folder.as_deref(), Some("Sent Items"));
    }

    #[test]
    fn test_parse_multiple_operators() {
        let query = parse_query("FROM:alice subject:meeting is:unread has:attachment");
        assert_eq!(query.from, vec!["alice"]);
        assert_eq!(query.subject, vec!["meeting"]);
        assert_eq!(query.is_unread, Some(true));
        assert_eq!(query.has_attachment, Some(true));
        assert!(query.terms.is_empty());
    }

    #[test]
    fn test_parse_negative_flags() {
        let query = parse_query("is:read has:noattachment");
        assert_eq!(query.is_unread, Some(false));
        assert_eq!(query.has_attachment, Some(false));
    }

    #[test]
    fn test_unknown_values_become_terms() {
        let query = parse_query("is:starred has:drive");
        assert_eq!(query.terms, vec!["is:starred", "has:drive"]);
        assert!(query.is_unread.is_none());
    }

    #[test]
    fn test_parse_invalid_operator_ignored() {
        let query = parse_query("foo:bar");
        assert_eq!(query.terms, vec!["foo:bar"]);
    }

    #[test]
    fn test_parse_operator_with_empty_value() {
        let query = parse_query("from: hello");
        assert!(query.from.is_empty());
        assert_eq!(query.terms, vec!["from:", "hello"]);
    }

    #[test]
    fn test_parse_empty_query() {
        assert!(parse_query("").is_empty());
        assert!(parse_query("   ").is_empty());
    }

    #[test]
    fn test_scope() {
        assert_eq!(parse_query("in:all").scope(), Some(FolderScope::All));
        assert_eq!(
            parse_query("in:Custom/Projects").scope(),
            Some(FolderScope::Folder("Custom/Projects".to_string()))
        );
        assert_eq!(parse_query("budget").scope(), None);
    }

    #[test]
    fn test_to_filters() {
        let query = parse_query("report subject:q3 from:alice from:bob importance:high after:2024/01/01 before:7d");
        let filters = query.to_filters(now()).unwrap();
        assert_eq!(filters.keywords, vec!["report", "q3"]);
        assert_eq!(filters.sender.as_deref(), Some("bob"));
        assert_eq!(filters.importance, Some(Importance::High));
        assert_eq!(filters.since, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(filters.until, Some(Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_to_filters_rejects_bad_values() {
        let err = parse_query("after:someday").to_filters(now()).unwrap_err();
        assert!(matches!(err, MailError::InvalidArgument(_)));

        let err = parse_query("importance:urgent").to_filters(now()).unwrap_err();
        assert!(matches!(err, MailError::InvalidArgument(_)));
    }
}
