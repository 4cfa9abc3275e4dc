/// Pagination window for admin listings. Out-of-range values are clamped to
/// sane bounds rather than rejected: page >= 1, page_size in [1, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

impl Page {
    pub fn clamped(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        // Saturate so an absurd page number yields an empty window instead
        // of overflowing into a negative OFFSET.
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total == 0 {
            0
        } else {
            (total + self.page_size - 1) / self.page_size
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(Page::clamped(None, None), Page { page: 1, page_size: 10 });
        assert_eq!(Page::clamped(Some(0), Some(0)), Page { page: 1, page_size: 1 });
        assert_eq!(Page::clamped(Some(-5), Some(1000)), Page { page: 1, page_size: 100 });
        assert_eq!(Page::clamped(Some(3), Some(25)), Page { page: 3, page_size: 25 });
    }

    #[test]
    fn offset_never_overflows() {
        assert_eq!(Page::clamped(Some(i64::MAX), Some(100)).offset(), i64::MAX);
        assert!(Page::clamped(Some(i64::MAX - 1), Some(3)).offset() > 0);
        assert_eq!(Page { page: i64::MAX, page_size: 1 }.offset(), i64::MAX - 1);
    }

    #[test]
    fn offset_and_total_pages() {
        let page = Page { page: 3, page_size: 10 };
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(25), 3);
        assert_eq!(page.total_pages(30), 3);
        assert_eq!(page.total_pages(31), 4);
    }
}
