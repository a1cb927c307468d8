//! Message actions
//!
//! High-level handlers for opening and moving messages, with each action
//! recorded in the audit log.

mod handler;

pub use handler::{ActionHandler, MoveReport};
