//! Action handler for message operations
//!
//! Runs an operation against the backend, then records it in the audit
//! log. Audit failures never affect the outcome.

use log::{info, warn};
use serde_json::json;
use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::backend::MailBackend;
use crate::error::{MailError, Result};
use crate::models::{Message, MessageId};

/// Outcome of a batch move
#[derive(Debug, Default)]
pub struct MoveReport {
    pub moved: Vec<MessageId>,
    pub failed: Vec<(MessageId, MailError)>,
}

impl MoveReport {
    pub fn all_moved(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Handler for opening and moving messages
pub struct ActionHandler {
    backend: Arc<dyn MailBackend>,
    audit: Arc<AuditLogger>,
}

impl ActionHandler {
    /// Create a new action handler
    pub fn new(backend: Arc<dyn MailBackend>, audit: Arc<AuditLogger>) -> Self {
        Self { backend, audit }
    }

    /// Fetch a single message for display
    pub fn open_message(&self, id: &MessageId) -> Result<Message> {
        let result = self.backend.get_message(id);
        self.audit.log_operation(
            "open",
            json!({ "message_id": id.as_str(), "success": result.is_ok() }),
            usize::from(result.is_ok()),
        );
        result
    }

    /// Move a message to `destination`
    pub fn move_message(&self, id: &MessageId, destination: &str) -> Result<()> {
        let result = self.backend.move_message(id, destination);
        match &result {
            Ok(()) => info!("Moved message {} to {}", id, destination),
            Err(e) => warn!("Could not move message {} to {}: {}", id, destination, e),
        }
        self.audit.log_operation(
            "move",
            json!({
                "message_id": id.as_str(),
                "destination": destination,
                "success": result.is_ok(),
            }),
            usize::from(result.is_ok()),
        );
        result
    }

    /// Move several messages; a failure does not stop the rest
    pub fn move_messages(&self, ids: &[MessageId], destination: &str) -> MoveReport {
        let mut report = MoveReport::default();
        for id in ids {
            match self.backend.move_message(id, destination) {
                Ok(()) => report.moved.push(id.clone()),
                Err(e) => {
                    warn!("Could not move message {} to {}: {}", id, destination, e);
                    report.failed.push((id.clone(), e));
                }
            }
        }

        info!(
            "Batch move to {}: {} moved, {} failed",
            destination,
            report.moved.len(),
            report.failed.len()
        );
        let failed: Vec<&str> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
        self.audit.log_operation(
            "move_batch",
            json!({
                "destination": destination,
                "requested": ids.len(),
                "failed": failed,
            }),
            report.moved.len(),
        );
        report
    }
}
