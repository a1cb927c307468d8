//! Folder model representing a node in the mailbox hierarchy

use serde::{Deserialize, Serialize};

use crate::error::{MailError, Result};

/// Separator between folder path segments
pub const PATH_SEPARATOR: char = '/';

/// Path of the default inbox folder
pub const INBOX: &str = "Inbox";

/// A mail folder
///
/// `email_count` and `unread_count` are backend-reported aggregates and may
/// drift from the messages actually listed for the folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FolderRecord")]
pub struct Folder {
    /// Full path (e.g., "Inbox", "Custom/Projects")
    pub path: String,
    /// Display name, the last path segment
    pub name: String,
    /// Number of messages in the folder
    pub email_count: u32,
    /// Number of unread messages
    pub unread_count: u32,
}

impl Folder {
    /// Create a folder, deriving the name from the last path segment
    pub fn new(path: impl Into<String>, email_count: u32, unread_count: u32) -> Result<Self> {
        let path = path.into();
        let folder = Self {
            name: last_segment(&path).to_string(),
            path,
            email_count,
            unread_count,
        };
        folder.validate()?;
        Ok(folder)
    }

    /// Check the construction invariants
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(MailError::validation("folder path must not be empty"));
        }
        if self.path.split(PATH_SEPARATOR).any(|s| s.trim().is_empty()) {
            return Err(MailError::validation(format!(
                "folder path '{}' has an empty segment",
                self.path
            )));
        }
        if self.name != last_segment(&self.path) {
            return Err(MailError::validation(format!(
                "folder '{}' has name '{}', expected its last path segment",
                self.path, self.name
            )));
        }
        if self.unread_count > self.email_count {
            return Err(MailError::validation(format!(
                "folder '{}' has unread_count ({}) greater than email_count ({})",
                self.path, self.unread_count, self.email_count
            )));
        }
        Ok(())
    }

    /// Path of the parent folder, if this folder is nested
    pub fn parent_path(&self) -> Option<&str> {
        self.path
            .rsplit_once(PATH_SEPARATOR)
            .map(|(parent, _)| parent)
    }

    /// Whether the folder sits below a parent folder
    pub fn is_nested(&self) -> bool {
        self.path.contains(PATH_SEPARATOR)
    }

    /// Whether this folder's path matches `path`
    ///
    /// The inbox matches case-insensitively, every other folder exactly.
    pub fn matches_path(&self, path: &str) -> bool {
        if self.path.eq_ignore_ascii_case(INBOX) {
            path.eq_ignore_ascii_case(INBOX)
        } else {
            self.path == path
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or_default()
}

/// Unvalidated wire form of [`Folder`]
#[derive(Deserialize)]
struct FolderRecord {
    path: String,
    name: String,
    email_count: u32,
    unread_count: u32,
}

impl TryFrom<FolderRecord> for Folder {
    type Error = MailError;

    fn try_from(r: FolderRecord) -> Result<Self> {
        let folder = Folder {
            path: r.path,
            name: r.name,
            email_count: r.email_count,
            unread_count: r.unread_count,
        };
        folder.validate()?;
        Ok(folder)
    }
}
