//! Folder-scoped message search
//!
//! Pulls messages for one folder (or every folder the backend knows) and
//! keeps those matching all of the given [`SearchFilters`]. Filtering is
//! done in memory; there is no index.

mod dates;
mod query_parser;

pub use dates::{parse_date_expression, validate_range};
pub use query_parser::{ParsedQuery, parse_query};

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::backend::MailBackend;
use crate::error::Result;
use crate::models::{Importance, Message};

/// Which folders a search covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderScope {
    All,
    Folder(String),
}

impl FolderScope {
    pub const ALL: &'static str = "all";

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => Self::ALL,
            Self::Folder(path) => path,
        }
    }
}

impl From<&str> for FolderScope {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case(Self::ALL) {
            Self::All
        } else {
            Self::Folder(value.to_string())
        }
    }
}

/// Optional predicates, combined with AND
///
/// Serializes without unset fields, which is the form the audit log records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchFilters {
    /// Case-insensitive substrings; each must occur in subject or body
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_unread: Option<bool>,
    /// Inclusive lower bound on `received_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `received_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the sender address or display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attachments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    /// Rejects messages whose sender address or name contains any of these
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_senders: Vec<String>,
    /// Rejects messages whose subject contains any of these
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_subjects: Vec<String>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keywords.push(keyword.into());
        self
    }

    pub fn unread(mut self, is_unread: bool) -> Self {
        self.is_unread = Some(is_unread);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn attachments(mut self, has_attachments: bool) -> Self {
        self.has_attachments = Some(has_attachments);
        self
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = Some(importance);
        self
    }

    pub fn exclude_sender(mut self, sender: impl Into<String>) -> Self {
        self.exclude_senders.push(sender.into());
        self
    }

    pub fn exclude_subject(mut self, subject: impl Into<String>) -> Self {
        self.exclude_subjects.push(subject.into());
        self
    }

    /// Overlay values set in `other` on top of these
    ///
    /// Scalars from `other` replace ours; keywords and exclusions accumulate.
    pub fn merge(mut self, other: SearchFilters) -> Self {
        self.keywords.extend(other.keywords);
        self.exclude_senders.extend(other.exclude_senders);
        self.exclude_subjects.extend(other.exclude_subjects);
        self.is_unread = other.is_unread.or(self.is_unread);
        self.since = other.since.or(self.since);
        self.until = other.until.or(self.until);
        self.sender = other.sender.or(self.sender);
        self.has_attachments = other.has_attachments.or(self.has_attachments);
        self.importance = other.importance.or(self.importance);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject contradictory combinations
    pub fn validate(&self) -> Result<()> {
        validate_range(self.since, self.until)
    }

    pub fn matches(&self, message: &Message) -> bool {
        if !self.keywords.is_empty() {
            let subject = message.subject.to_lowercase();
            let body = message.body.to_lowercase();
            let all_found = self.keywords.iter().all(|k| {
                let k = k.to_lowercase();
                subject.contains(&k) || body.contains(&k)
            });
            if !all_found {
                return false;
            }
        }
        if let Some(unread) = self.is_unread
            && message.is_read == unread
        {
            return false;
        }
        if self.since.is_some_and(|since| message.received_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| message.received_at > until) {
            return false;
        }
        if self.sender.as_deref().is_some_and(|s| !sent_by(message, s)) {
            return false;
        }
        if self.exclude_senders.iter().any(|s| sent_by(message, s)) {
            return false;
        }
        if !self.exclude_subjects.is_empty() {
            let subject = message.subject.to_lowercase();
            if self
                .exclude_subjects
                .iter()
                .any(|s| subject.contains(&s.to_lowercase()))
            {
                return false;
            }
        }
        if self
            .has_attachments
            .is_some_and(|wanted| message.has_attachments != wanted)
        {
            return false;
        }
        if self.importance.is_some_and(|level| message.importance != level) {
            return false;
        }
        true
    }
}

/// Case-insensitive substring match on the sender address or display name
fn sent_by(message: &Message, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    message.from.email.to_lowercase().contains(&needle)
        || message
            .from
            .name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
}

/// Search `scope` for messages matching `filters`
///
/// Folders are visited in backend order and messages keep backend order
/// within each folder. An unknown folder fails with `NotFound`.
pub fn search(
    backend: &dyn MailBackend,
    scope: &FolderScope,
    filters: &SearchFilters,
) -> Result<Vec<Message>> {
    filters.validate()?;

    let folders = match scope {
        FolderScope::All => backend
            .list_folders()?
            .into_iter()
            .map(|f| f.path)
            .collect(),
        FolderScope::Folder(path) => vec![path.clone()],
    };

    let mut results = Vec::new();
    for path in &folders {
        let messages = backend.list_messages(path)?;
        let before = results.len();
        results.extend(messages.into_iter().filter(|m| filters.matches(m)));
        debug!("{}: {} matching message(s)", path, results.len() - before);
    }
    Ok(results)
}
