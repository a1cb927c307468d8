//! Domain models for mail entities

mod folder;
mod message;

pub use folder::{Folder, INBOX, PATH_SEPARATOR};
pub use message::{EmailAddress, Importance, Message, MessageBuilder, MessageId, is_valid_address};
