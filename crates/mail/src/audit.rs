//! Append-only audit trail
//!
//! One JSON object per line:
//! `{"timestamp", "operation", "user", "details", "result_count"}`.
//! Writing and reading are best-effort: failures are logged at debug level
//! and never reach the caller.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A single audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub user: String,
    pub details: Value,
    pub result_count: usize,
}

/// Writer and reader for the audit log file
///
/// Constructed once from configuration. A disabled logger writes nothing.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    path: PathBuf,
    enabled: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        let path = path.into();
        if enabled
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            debug!("Could not create audit log directory {}: {}", parent.display(), e);
        }
        Self { path, enabled }
    }

    /// A logger that records nothing
    pub fn disabled() -> Self {
        Self {
            path: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry for `operation`
    pub fn log_operation(&self, operation: &str, details: Value, result_count: usize) {
        if !self.enabled {
            return;
        }
        let entry = AuditEntry {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            user: current_user(),
            details,
            result_count,
        };
        if let Err(e) = self.append(&entry) {
            debug!("Failed to write audit entry to {}: {}", self.path.display(), e);
        }
    }

    /// Append an entry for a read or search, recording its filter parameters
    pub fn log_filter_operation<F: Serialize>(&self, operation: &str, filters: &F, result_count: usize) {
        let filters = serde_json::to_value(filters).unwrap_or(Value::Null);
        self.log_operation(
            operation,
            json!({ "type": "filter_operation", "filters": filters }),
            result_count,
        );
    }

    /// The last `limit` well-formed entries, oldest first
    ///
    /// Malformed lines are skipped. A missing or unreadable file yields
    /// no entries.
    pub fn entries(&self, limit: usize) -> Vec<AuditEntry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Could not read audit log {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        let entries: Vec<AuditEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping malformed audit line: {}", e);
                    None
                }
            })
            .collect();

        let skip = entries.len().saturating_sub(limit);
        entries.into_iter().skip(skip).collect()
    }

    fn append(&self, entry: &AuditEntry) -> io::Result<()> {
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

/// The invoking user: `$USER`, then `$USERNAME`, else "unknown"
pub fn current_user() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_and_read_back() {
        let tmp = TempDir::new().unwrap();
        let logger = AuditLogger::new(tmp.path().join("logs/audit.log"), true);

        logger.log_operation("open", json!({ "message_id": "inbox-001" }), 1);
        logger.log_filter_operation("find", &json!({ "keyword": "budget" }), 4);

        let entries = logger.entries(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, "open");
        assert_eq!(entries[0].details["message_id"], "inbox-001");
        assert_eq!(entries[1].result_count, 4);
        assert_eq!(entries[1].details["type"], "filter_operation");
        assert_eq!(entries[1].details["filters"]["keyword"], "budget");
        assert_eq!(entries[1].user, current_user());
    }

    #[test]
    fn test_entries_skip_malformed_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.log");
        let logger = AuditLogger::new(&path, true);
        logger.log_operation("read", json!({}), 3);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file, "{{\"operation\": \"partial\"}}").unwrap();
        writeln!(file).unwrap();
        drop(file);
        logger.log_operation("move", json!({}), 1);

        let ops: Vec<_> = logger.entries(10).into_iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec!["read", "move"]);
    }

    #[test]
    fn test_entries_limit_keeps_most_recent() {
        let tmp = TempDir::new().unwrap();
        let logger = AuditLogger::new(tmp.path().join("audit.log"), true);
        for i in 0..5 {
            logger.log_operation(&format!("op-{i}"), json!({}), i);
        }
        let ops: Vec<_> = logger.entries(2).into_iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec!["op-3", "op-4"]);
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("audit.log");
        let logger = AuditLogger::new(&path, false);
        logger.log_operation("open", json!({}), 1);
        assert!(!path.exists());
        assert!(logger.entries(10).is_empty());
    }

    #[test]
    fn test_unwritable_path_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be opened for appending
        let logger = AuditLogger::new(tmp.path(), true);
        logger.log_operation("open", json!({}), 1);
        assert!(logger.entries(10).is_empty());
    }
}
