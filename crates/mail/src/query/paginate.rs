//! Page-at-a-time navigation over a materialized result set

use serde::Serialize;

use crate::error::{MailError, Result};

/// Position metadata for the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// 1-based; 0 when there are no items
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Fixed-size pages over an ordered sequence
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    page_size: usize,
    /// 0-based index of the current page
    current: usize,
}

impl<T> Paginator<T> {
    /// Fails with `InvalidArgument` when `page_size` is 0
    pub fn new(items: Vec<T>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(MailError::invalid_argument(
                "Page size must be a positive number",
            ));
        }
        Ok(Self {
            items,
            page_size,
            current: 0,
        })
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    pub fn total_pages(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }

    /// Items on the current page; the last page may be shorter
    pub fn current_page(&self) -> &[T] {
        let start = (self.current * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        &self.items[start..end]
    }

    /// Advance unless already on the last page
    pub fn next_page(&mut self) -> bool {
        if self.current + 1 < self.total_pages() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Step back unless already on the first page
    pub fn previous_page(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a 1-based page number
    pub fn go_to_page(&mut self, page: usize) -> Result<()> {
        let total = self.total_pages();
        if page == 0 || page > total {
            return Err(MailError::invalid_argument(format!(
                "Page {} is out of range (1-{})",
                page, total
            )));
        }
        self.current = page - 1;
        Ok(())
    }

    pub fn page_info(&self) -> PageInfo {
        let total_pages = self.total_pages();
        let current_page = if total_pages == 0 { 0 } else { self.current + 1 };
        PageInfo {
            current_page,
            total_pages,
            total_items: self.items.len(),
            page_size: self.page_size,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paginator(n: usize, page_size: usize) -> Paginator<usize> {
        Paginator::new((0..n).collect(), page_size).unwrap()
    }

    #[test]
    fn test_zero_page_size_is_invalid() {
        let err = Paginator::<u8>::new(vec![1, 2], 0).unwrap_err();
        assert!(matches!(err, MailError::InvalidArgument(_)));
    }

    #[test]
    fn test_empty_sequence() {
        let mut p = paginator(0, 10);
        assert!(p.current_page().is_empty());
        let info = p.page_info();
        assert_eq!((info.current_page, info.total_pages, info.total_items), (0, 0, 0));
        assert!(!info.has_next && !info.has_previous);
        assert!(!p.next_page());
        assert!(!p.previous_page());
    }

    #[test]
    fn test_navigation() {
        let mut p = paginator(25, 10);
        assert_eq!(p.current_page(), &(0..10).collect::<Vec<_>>()[..]);
        assert!(!p.previous_page());

        assert!(p.next_page());
        assert!(p.next_page());
        assert_eq!(p.current_page(), &[20, 21, 22, 23, 24]);
        assert!(!p.next_page());

        let info = p.page_info();
        assert_eq!((info.current_page, info.total_pages), (3, 3));
        assert!(info.has_previous && !info.has_next);

        assert!(p.previous_page());
        assert_eq!(p.page_info().current_page, 2);
    }

    #[test]
    fn test_go_to_page() {
        let mut p = paginator(25, 10);
        p.go_to_page(3).unwrap();
        assert_eq!(p.current_page().len(), 5);
        assert!(p.go_to_page(0).is_err());
        assert!(p.go_to_page(4).is_err());
        assert_eq!(p.page_info().current_page, 3);
    }

    #[test]
    fn test_page_sizes_cover_sequence() {
        for (n, size) in [(1, 1), (7, 3), (10, 5), (11, 5), (100, 7)] {
            let mut p = paginator(n, size);
            let mut seen = Vec::new();
            loop {
                let page_len = p.current_page().len();
                assert!(page_len <= size);
                seen.extend_from_slice(p.current_page());
                if !p.next_page() {
                    break;
                }
                assert_eq!(page_len, size, "only the last page may be short");
            }
            assert_eq!(seen, (0..n).collect::<Vec<_>>());
            assert_eq!(p.total_pages(), n.div_ceil(size));
        }
    }
}
