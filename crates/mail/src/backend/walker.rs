//! Defensive iteration over collections with an untrusted length
//!
//! Some mailbox collections report a size that overstates what can
//! actually be fetched. The walker probes positions one by one starting
//! at 1 and stops after [`MAX_CONSECUTIVE_FAILURES`] misses in a row, or
//! once it has gone that far past the reported length.
//!
//! Collections whose length is exact, such as a directory snapshot, use
//! [`walk_snapshot`] instead: every position is visited and failures only
//! ever skip their own entry.

use log::{debug, warn};

use crate::error::MailError;

/// Consecutive fetch failures that end a walk
pub const MAX_CONSECUTIVE_FAILURES: usize = 3;

/// A collection addressed by 1-based position
pub trait PositionalSource {
    type Item;

    /// The collection's own idea of its length; may be wrong
    fn reported_len(&self) -> usize;

    /// Fetch the item at `position` (1-based)
    fn fetch(&self, position: usize) -> Result<Self::Item, MailError>;
}

/// A position the walker could not resolve
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub position: usize,
    pub reason: String,
}

/// Items gathered by a walk plus diagnostics for skipped positions
#[derive(Debug)]
pub struct WalkOutcome<T> {
    pub items: Vec<T>,
    pub skipped: Vec<Skipped>,
}

/// Walk `source` without trusting its reported length
///
/// Per-item failures become [`Skipped`] diagnostics and never propagate.
pub fn walk<S: PositionalSource>(source: &S) -> WalkOutcome<S::Item> {
    let reported = source.reported_len();
    let ceiling = reported + MAX_CONSECUTIVE_FAILURES;

    let mut items = Vec::new();
    let mut skipped = Vec::new();
    let mut consecutive_failures = 0;
    let mut position = 1;

    while consecutive_failures < MAX_CONSECUTIVE_FAILURES && position <= ceiling {
        match source.fetch(position) {
            Ok(item) => {
                items.push(item);
                consecutive_failures = 0;
            }
            Err(e) => {
                if position <= reported {
                    warn!("Skipping inaccessible item at position {}: {}", position, e);
                } else {
                    debug!("No item at position {} (reported {}): {}", position, reported, e);
                }
                skipped.push(Skipped {
                    position,
                    reason: e.to_string(),
                });
                consecutive_failures += 1;
            }
        }
        position += 1;
    }

    WalkOutcome { items, skipped }
}

/// Visit every position of a collection whose reported length is exact
///
/// Failures never end the walk, so a run of unreadable entries cannot hide
/// the readable ones after it.
pub fn walk_snapshot<S: PositionalSource>(source: &S) -> WalkOutcome<S::Item> {
    let mut items = Vec::new();
    let mut skipped = Vec::new();

    for position in 1..=source.reported_len() {
        match source.fetch(position) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!("Skipping unreadable item at position {}: {}", position, e);
                skipped.push(Skipped {
                    position,
                    reason: e.to_string(),
                });
            }
        }
    }

    WalkOutcome { items, skipped }
}
