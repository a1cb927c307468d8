//! Result-set pipeline
//!
//! search → sort → deliver, where delivery is either a [`Paginator`] or a
//! [`ChunkStream`]. Each stage behaves the same for every backend.

mod paginate;
mod sort;
mod stream;

pub use paginate::{PageInfo, Paginator};
pub use sort::{SortDirection, SortField, SortOrder, sort_in_place, sort_messages};
pub use stream::{
    ChunkStream, DEFAULT_CHUNK_SIZE, LARGE_RESULT_THRESHOLD, MemoryProbe, ProcessMemory,
    ResourceGuard, is_large_result,
};

use crate::backend::MailBackend;
use crate::error::Result;
use crate::models::Message;
use crate::search::{FolderScope, SearchFilters, search};

/// Search then sort
///
/// Lookup errors from the backend come back unchanged.
pub fn fetch_sorted(
    backend: &dyn MailBackend,
    scope: &FolderScope,
    filters: &SearchFilters,
    order: SortOrder,
) -> Result<Vec<Message>> {
    let mut messages = search(backend, scope, filters)?;
    sort_in_place(&mut messages, order);
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FixtureBackend;

    #[test]
    fn test_fetch_sorted_newest_first() {
        let backend = FixtureBackend::new();
        let messages = fetch_sorted(
            &backend,
            &FolderScope::All,
            &SearchFilters::new(),
            SortOrder::default(),
        )
        .unwrap();
        assert_eq!(messages.len(), 6);
        assert!(messages.windows(2).all(|w| w[0].received_at >= w[1].received_at));
    }

    #[test]
    fn test_fetch_sorted_unknown_folder() {
        let backend = FixtureBackend::new();
        let err = fetch_sorted(
            &backend,
            &FolderScope::Folder("Nope".into()),
            &SearchFilters::new(),
            SortOrder::default(),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
