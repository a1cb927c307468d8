//! Mail crate - Business logic for browsing a desktop mail store
//!
//! This crate provides the platform-independent pieces of the Deskmail CLI:
//! - Domain models (Folder, Message, EmailAddress)
//! - Backend trait with a fixture and a live Maildir adapter
//! - Defensive walker for collections with untrusted lengths
//! - Search, sort, pagination and streamed delivery of result sets
//! - Action handlers (open, move) and the audit log
//!
//! This crate has no terminal or UI dependencies.

pub mod actions;
pub mod audit;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod query;
pub mod search;

pub use actions::{ActionHandler, MoveReport};
pub use audit::{AuditEntry, AuditLogger};
pub use backend::{BackendKind, FixtureBackend, MailBackend, MaildirBackend, create_backend};
pub use config::AppConfig;
pub use error::{Entity, MailError, Result};
pub use models::{EmailAddress, Folder, Importance, Message, MessageId};
pub use query::{
    ChunkStream, PageInfo, Paginator, ResourceGuard, SortDirection, SortField, SortOrder,
    fetch_sorted, sort_messages,
};
pub use search::{FolderScope, ParsedQuery, SearchFilters, parse_query, search};
