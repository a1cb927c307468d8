//! Backend trait definitions

use crate::error::Result;
use crate::models::{Folder, Message, MessageId};

/// Trait for mailbox data sources
///
/// This trait abstracts over the deterministic fixture and the live mailbox
/// adapter. Every call is blocking and is not retried; lookup failures are
/// reported as `MailError::NotFound`.
pub trait MailBackend {
    /// List all known folders, in an order that is stable within a session
    fn list_folders(&self) -> Result<Vec<Folder>>;

    /// List the messages stored in a folder
    fn list_messages(&self, folder_path: &str) -> Result<Vec<Message>>;

    /// Get a message by ID from any folder
    fn get_message(&self, id: &MessageId) -> Result<Message>;

    /// Move a message to another folder
    ///
    /// On success the message's `folder_path` changes and both folders'
    /// counts reflect the move. On failure nothing changes.
    fn move_message(&self, id: &MessageId, destination: &str) -> Result<()>;

    /// Get metadata for a single folder
    fn get_folder_info(&self, folder_path: &str) -> Result<Folder>;
}
