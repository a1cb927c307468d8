//! Deterministic in-memory backend
//!
//! Holds a small fixed dataset with stable IDs and timestamps. Used for
//! tests and as the `mock` backend selection.

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::debug;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::MailBackend;
use crate::error::{MailError, Result};
use crate::models::{EmailAddress, Folder, Importance, Message, MessageId};

/// Folders and messages, in insertion order
struct FixtureData {
    folders: Vec<Folder>,
    messages: Vec<Message>,
}

impl FixtureData {
    fn folder_index(&self, path: &str) -> Option<usize> {
        self.folders.iter().position(|f| f.matches_path(path))
    }

    fn message_index(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }
}

/// In-memory implementation of MailBackend
///
/// Messages moved to another folder are appended after that folder's
/// existing messages.
pub struct FixtureBackend {
    data: RwLock<FixtureData>,
}

impl FixtureBackend {
    /// Create a backend holding the default fixture dataset
    pub fn new() -> Self {
        let (folders, messages) = default_dataset();
        Self {
            data: RwLock::new(FixtureData { folders, messages }),
        }
    }

    /// Create a backend over a custom dataset
    ///
    /// Fails if a message references an unknown folder or two messages
    /// share an ID.
    pub fn with_data(folders: Vec<Folder>, messages: Vec<Message>) -> Result<Self> {
        let data = FixtureData { folders, messages };
        for (i, message) in data.messages.iter().enumerate() {
            if data.folder_index(&message.folder_path).is_none() {
                return Err(MailError::validation(format!(
                    "message '{}' references unknown folder '{}'",
                    message.id, message.folder_path
                )));
            }
            if data.messages[..i].iter().any(|m| m.id == message.id) {
                return Err(MailError::validation(format!(
                    "duplicate message id '{}'",
                    message.id
                )));
            }
        }
        Ok(Self {
            data: RwLock::new(data),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, FixtureData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FixtureData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MailBackend for FixtureBackend {
    fn list_folders(&self) -> Result<Vec<Folder>> {
        Ok(self.read().folders.clone())
    }

    fn list_messages(&self, folder_path: &str) -> Result<Vec<Message>> {
        let data = self.read();
        let folder = data
            .folder_index(folder_path)
            .map(|i| &data.folders[i])
            .ok_or_else(|| MailError::folder_not_found(folder_path))?;

        Ok(data
            .messages
            .iter()
            .filter(|m| folder.matches_path(&m.folder_path))
            .cloned()
            .collect())
    }

    fn get_message(&self, id: &MessageId) -> Result<Message> {
        let data = self.read();
        data.message_index(id)
            .map(|i| data.messages[i].clone())
            .ok_or_else(|| MailError::message_not_found(id.as_str()))
    }

    fn move_message(&self, id: &MessageId, destination: &str) -> Result<()> {
        let mut data = self.write();
        let msg_idx = data
            .message_index(id)
            .ok_or_else(|| MailError::message_not_found(id.as_str()))?;
        let dest_idx = data
            .folder_index(destination)
            .ok_or_else(|| MailError::folder_not_found(destination))?;
        if data.folders[dest_idx].matches_path(&data.messages[msg_idx].folder_path) {
            return Ok(());
        }

        let mut message = data.messages.remove(msg_idx);
        let unread = u32::from(!message.is_read);

        if let Some(src_idx) = data.folder_index(&message.folder_path) {
            let source = &mut data.folders[src_idx];
            source.email_count = source.email_count.saturating_sub(1);
            source.unread_count = source.unread_count.saturating_sub(unread);
        }

        let dest = &mut data.folders[dest_idx];
        dest.email_count = dest.email_count.saturating_add(1);
        dest.unread_count = (dest.unread_count + unread).min(dest.email_count);

        debug!("Moved {} from {} to {}", id, message.folder_path, dest.path);
        message.folder_path = dest.path.clone();
        data.messages.push(message);
        Ok(())
    }

    fn get_folder_info(&self, folder_path: &str) -> Result<Folder> {
        let data = self.read();
        data.folder_index(folder_path)
            .map(|i| data.folders[i].clone())
            .ok_or_else(|| MailError::folder_not_found(folder_path))
    }
}

/// Fixed reference instant for fixture timestamps
pub fn fixture_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

struct Seed {
    id: &'static str,
    folder: &'static str,
    subject: &'static str,
    sender: (&'static str, &'static str),
    to: &'static [&'static str],
    age: Duration,
    body: &'static str,
    attachments: u32,
    is_read: bool,
    importance: Importance,
}

fn default_dataset() -> (Vec<Folder>, Vec<Message>) {
    let folder_specs = [
        ("Inbox", 25, 5),
        ("Sent Items", 120, 0),
        ("Drafts", 3, 3),
        ("Deleted Items", 42, 0),
        ("Custom/Projects", 15, 2),
        ("Custom/Archive", 200, 0),
    ];
    let folders = folder_specs
        .into_iter()
        .filter_map(|(path, total, unread)| Folder::new(path, total, unread).ok())
        .collect();

    let seeds = [
        Seed {
            id: "inbox-001",
            folder: "Inbox",
            subject: "Weekly Team Meeting",
            sender: ("Alice Manager", "manager@company.com"),
            to: &["user@company.com"],
            age: Duration::hours(2),
            body: "Hi team, our weekly meeting is scheduled for Friday at 2 PM.",
            attachments: 0,
            is_read: false,
            importance: Importance::High,
        },
        Seed {
            id: "inbox-002",
            folder: "Inbox",
            subject: "Project Update Required",
            sender: ("Bob ProjectManager", "pm@company.com"),
            to: &["user@company.com", "team@company.com"],
            age: Duration::days(1),
            body: "Please provide an update on the current project status.",
            attachments: 2,
            is_read: true,
            importance: Importance::Normal,
        },
        Seed {
            id: "inbox-003",
            folder: "Inbox",
            subject: "System Maintenance Notice",
            sender: ("IT Support", "it@company.com"),
            to: &["all@company.com"],
            age: Duration::days(2),
            body: "The system will be down for maintenance this weekend.",
            attachments: 0,
            is_read: true,
            importance: Importance::Low,
        },
        Seed {
            id: "sent-001",
            folder: "Sent Items",
            subject: "Re: Project Update Required",
            sender: ("Current User", "user@company.com"),
            to: &["pm@company.com"],
            age: Duration::hours(6),
            body: "The project is on track and will be completed by Friday.",
            attachments: 0,
            is_read: true,
            importance: Importance::Normal,
        },
        Seed {
            id: "sent-002",
            folder: "Sent Items",
            subject: "Meeting Notes",
            sender: ("Current User", "user@company.com"),
            to: &["team@company.com"],
            age: Duration::days(3),
            body: "Here are the notes from yesterday's meeting.",
            attachments: 1,
            is_read: true,
            importance: Importance::Normal,
        },
        Seed {
            id: "draft-001",
            folder: "Drafts",
            subject: "Vacation Request",
            sender: ("Current User", "user@company.com"),
            to: &["hr@company.com"],
            age: Duration::hours(12),
            body: "I would like to request vacation time for next month.",
            attachments: 0,
            is_read: false,
            importance: Importance::Normal,
        },
    ];

    let anchor = fixture_anchor();
    let messages = seeds
        .into_iter()
        .filter_map(|seed| {
            Message::builder(seed.id, seed.folder)
                .from(EmailAddress::with_name(seed.sender.0, seed.sender.1))
                .to(seed.to.iter().map(|a| EmailAddress::new(*a)).collect())
                .subject(seed.subject)
                .body(seed.body)
                .received_at(anchor - seed.age)
                .attachments(seed.attachments)
                .read(seed.is_read)
                .importance(seed.importance)
                .build()
                .ok()
        })
        .collect();

    (folders, messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dataset() {
        let backend = FixtureBackend::new();
        let folders = backend.list_folders().unwrap();
        assert_eq!(folders.len(), 6);
        assert_eq!(folders[0].path, "Inbox");

        let inbox = backend.list_messages("Inbox").unwrap();
        let ids: Vec<_> = inbox.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["inbox-001", "inbox-002", "inbox-003"]);
    }

    #[test]
    fn test_dataset_is_deterministic() {
        let a = FixtureBackend::new().get_message(&"inbox-001".into()).unwrap();
        let b = FixtureBackend::new().get_message(&"inbox-001".into()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.received_at, fixture_anchor() - Duration::hours(2));
    }

    #[test]
    fn test_list_messages_empty_folder() {
        let backend = FixtureBackend::new();
        assert!(backend.list_messages("Custom/Archive").unwrap().is_empty());
    }

    #[test]
    fn test_list_messages_unknown_folder() {
        let backend = FixtureBackend::new();
        let err = backend.list_messages("Nowhere").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_inbox_lookup_is_case_insensitive() {
        let backend = FixtureBackend::new();
        assert_eq!(backend.list_messages("inbox").unwrap().len(), 3);
        assert_eq!(backend.get_folder_info("INBOX").unwrap().path, "Inbox");
    }

    #[test]
    fn test_get_message_not_found() {
        let backend = FixtureBackend::new();
        let err = backend.get_message(&"nonexistent-123".into()).unwrap_err();
        assert!(err.to_string().contains("nonexistent-123"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_move_updates_message_and_counts() {
        let backend = FixtureBackend::new();
        backend
            .move_message(&"inbox-001".into(), "Custom/Projects")
            .unwrap();

        let moved = backend.get_message(&"inbox-001".into()).unwrap();
        assert_eq!(moved.folder_path, "Custom/Projects");

        let inbox = backend.get_folder_info("Inbox").unwrap();
        assert_eq!((inbox.email_count, inbox.unread_count), (24, 4));
        let projects = backend.get_folder_info("Custom/Projects").unwrap();
        assert_eq!((projects.email_count, projects.unread_count), (16, 3));

        assert_eq!(backend.list_messages("Inbox").unwrap().len(), 2);
        assert_eq!(backend.list_messages("Custom/Projects").unwrap().len(), 1);
    }

    #[test]
    fn test_move_to_unknown_folder_leaves_message() {
        let backend = FixtureBackend::new();
        let err = backend
            .move_message(&"inbox-002".into(), "InvalidFolder")
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("InvalidFolder"));

        let message = backend.get_message(&"inbox-002".into()).unwrap();
        assert_eq!(message.folder_path, "Inbox");
        assert_eq!(backend.get_folder_info("Inbox").unwrap().email_count, 25);
    }

    #[test]
    fn test_move_within_same_folder_keeps_order() {
        let backend = FixtureBackend::new();
        let before = backend.list_messages("Inbox").unwrap();
        let folder = backend.get_folder_info("Inbox").unwrap();

        backend.move_message(&"inbox-001".into(), "inbox").unwrap();

        assert_eq!(backend.list_messages("Inbox").unwrap(), before);
        assert_eq!(backend.get_folder_info("Inbox").unwrap(), folder);
    }

    #[test]
    fn test_move_unknown_message() {
        let backend = FixtureBackend::new();
        let err = backend.move_message(&"ghost".into(), "Inbox").unwrap_err();
        assert_eq!(err.to_string(), "Message 'ghost' not found");
    }

    #[test]
    fn test_with_data_rejects_unknown_folder() {
        let folders = vec![Folder::new("Inbox", 1, 0).unwrap()];
        let messages = vec![Message::builder("m1", "Elsewhere").build().unwrap()];
        assert!(FixtureBackend::with_data(folders, messages).is_err());
    }

    #[test]
    fn test_with_data_rejects_duplicate_ids() {
        let folders = vec![Folder::new("Inbox", 2, 0).unwrap()];
        let messages = vec![
            Message::builder("m1", "Inbox").build().unwrap(),
            Message::builder("m1", "Inbox").build().unwrap(),
        ];
        assert!(FixtureBackend::with_data(folders, messages).is_err());
    }
}
