//! Fixed-size pages over a list

#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into pages of `page_size`; out-of-range pages are clamped
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());

    Page {
        items: &items[start..end],
        page,
        total_pages,
        total_items: items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_of_fifteen() {
        let items: Vec<u32> = (0..32).collect();

        let first = paginate(&items, 15, 1);
        assert_eq!(first.items.len(), 15);
        assert_eq!(first.total_pages, 3);

        let last = paginate(&items, 15, 3);
        assert_eq!(last.items, &[30, 31]);
        assert_eq!(last.total_items, 32);
    }

    #[test]
    fn test_out_of_range_page_clamped() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(&items, 15, 0).page, 1);
        assert_eq!(paginate(&items, 4, 99).page, 3);
        assert_eq!(paginate(&items, 4, 99).items, &[8, 9]);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 15, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }
}
