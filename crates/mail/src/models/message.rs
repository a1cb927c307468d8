//! Message model representing a single email in a folder

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MailError, Result};

/// Unique identifier for a message (opaque, stable within a backend)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    /// Display name (e.g., "Alice Manager")
    pub name: Option<String>,
    /// Email address (e.g., "manager@company.com")
    pub email: String,
}

impl EmailAddress {
    /// Create a new email address with just the email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    /// Create a new email address with a display name
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: email.into(),
        }
    }

    /// Parse an email address from a string like "John Doe <john@example.com>"
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if let Some(angle_start) = s.rfind('<')
            && let Some(angle_end) = s.rfind('>')
            && angle_start < angle_end
        {
            let name = s[..angle_start].trim().trim_matches('"').trim();
            let email = s[angle_start + 1..angle_end].trim();
            return Self {
                name: if name.is_empty() {
                    None
                } else {
                    Some(name.to_string())
                },
                email: email.to_string(),
            };
        }

        Self {
            name: None,
            email: s.to_string(),
        }
    }

    /// Check that the address is syntactically `local@domain`
    pub fn is_valid(&self) -> bool {
        is_valid_address(&self.email)
    }

    /// Display name if present, otherwise the address itself
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Format the email address for display
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Syntactic address check: exactly one `@`, non-empty local part,
/// dotted domain without empty labels, no whitespace.
pub fn is_valid_address(address: &str) -> bool {
    if address.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    let mut parts = address.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Message importance, ordered `Low < Normal < High`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "Low",
            Importance::Normal => "Normal",
            Importance::High => "High",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "normal" => Ok(Importance::Normal),
            "high" => Ok(Importance::High),
            other => Err(MailError::invalid_argument(format!(
                "Invalid importance '{}'. Valid options are: low, normal, high",
                other
            ))),
        }
    }
}

/// A single email message
///
/// Construction goes through [`MessageBuilder::build`] or deserialization,
/// both of which validate the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MessageRecord")]
pub struct Message {
    /// Backend message ID
    pub id: MessageId,
    /// Subject line
    pub subject: String,
    /// Sender's email address
    pub from: EmailAddress,
    /// Recipients (To field)
    pub to: Vec<EmailAddress>,
    /// CC recipients
    pub cc: Vec<EmailAddress>,
    /// When the message was received
    pub received_at: DateTime<Utc>,
    /// Plain text body
    pub body: String,
    /// Slash-delimited path of the containing folder
    pub folder_path: String,
    pub is_read: bool,
    pub has_attachments: bool,
    pub attachment_count: u32,
    pub importance: Importance,
}

impl Message {
    /// Create a new message builder
    pub fn builder(id: impl Into<MessageId>, folder_path: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(id.into(), folder_path.into())
    }

    /// Check the construction invariants
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(MailError::validation("message id must not be empty"));
        }
        if self.folder_path.trim().is_empty() {
            return Err(MailError::validation(format!(
                "message '{}' has an empty folder path",
                self.id
            )));
        }
        if !self.from.is_valid() {
            return Err(MailError::validation(format!(
                "message '{}' has an invalid sender address '{}'",
                self.id, self.from.email
            )));
        }
        if let Some(bad) = self.to.iter().chain(&self.cc).find(|a| !a.is_valid()) {
            return Err(MailError::validation(format!(
                "message '{}' has an invalid recipient address '{}'",
                self.id, bad.email
            )));
        }
        if self.has_attachments != (self.attachment_count > 0) {
            return Err(MailError::validation(format!(
                "message '{}' has has_attachments={} but attachment_count={}",
                self.id, self.has_attachments, self.attachment_count
            )));
        }
        Ok(())
    }
}

/// Unvalidated wire form of [`Message`]
#[derive(Deserialize)]
struct MessageRecord {
    id: MessageId,
    subject: String,
    from: EmailAddress,
    to: Vec<EmailAddress>,
    #[serde(default)]
    cc: Vec<EmailAddress>,
    received_at: DateTime<Utc>,
    body: String,
    folder_path: String,
    #[serde(default)]
    is_read: bool,
    has_attachments: bool,
    #[serde(default)]
    attachment_count: u32,
    #[serde(default)]
    importance: Importance,
}

impl TryFrom<MessageRecord> for Message {
    type Error = MailError;

    fn try_from(r: MessageRecord) -> Result<Self> {
        let message = Message {
            id: r.id,
            subject: r.subject,
            from: r.from,
            to: r.to,
            cc: r.cc,
            received_at: r.received_at,
            body: r.body,
            folder_path: r.folder_path,
            is_read: r.is_read,
            has_attachments: r.has_attachments,
            attachment_count: r.attachment_count,
            importance: r.importance,
        };
        message.validate()?;
        Ok(message)
    }
}

/// Builder for creating Message instances
pub struct MessageBuilder {
    id: MessageId,
    folder_path: String,
    from: Option<EmailAddress>,
    to: Vec<EmailAddress>,
    cc: Vec<EmailAddress>,
    subject: String,
    body: String,
    received_at: Option<DateTime<Utc>>,
    is_read: bool,
    attachment_count: u32,
    importance: Importance,
}

impl MessageBuilder {
    fn new(id: MessageId, folder_path: String) -> Self {
        Self {
            id,
            folder_path,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            subject: String::new(),
            body: String::new(),
            received_at: None,
            is_read: false,
            attachment_count: 0,
            importance: Importance::Normal,
        }
    }

    pub fn from(mut self, from: EmailAddress) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: Vec<EmailAddress>) -> Self {
        self.to = to;
        self
    }

    pub fn cc(mut self, cc: Vec<EmailAddress>) -> Self {
        self.cc = cc;
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.received_at = Some(received_at);
        self
    }

    pub fn read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    /// Sets the attachment count; `has_attachments` follows from it
    pub fn attachments(mut self, count: u32) -> Self {
        self.attachment_count = count;
        self
    }

    pub fn importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn build(self) -> Result<Message> {
        let message = Message {
            id: self.id,
            subject: self.subject,
            from: self
                .from
                .unwrap_or_else(|| EmailAddress::new("unknown@unknown.com")),
            to: self.to,
            cc: self.cc,
            received_at: self.received_at.unwrap_or_else(Utc::now),
            body: self.body,
            folder_path: self.folder_path,
            is_read: self.is_read,
            has_attachments: self.attachment_count > 0,
            attachment_count: self.attachment_count,
            importance: self.importance,
        };
        message.validate()?;
        Ok(message)
    }
}
