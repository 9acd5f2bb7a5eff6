//! Fixed-size pagination over a derived view

use serde::Serialize;

/// Default number of repositories per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a derived view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,

    /// 1-based page number, always within `1..=total_pages`
    pub page_number: usize,

    /// Never zero, even for an empty list
    pub total_pages: usize,

    /// Length of the list the page was cut from
    pub total_items: usize,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page_number: 1,
            total_pages: 1,
            total_items: 0,
        }
    }
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }
}

/// Number of pages for `len` items, at least one
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Clamp a requested page number into `1..=total_pages`
pub fn clamp_page(requested: usize, total_pages: usize) -> usize {
    requested.clamp(1, total_pages.max(1))
}

/// Slice `list` into the requested page.
///
/// Out-of-range page numbers are silently corrected. A `page_size` of zero
/// is treated as one.
pub fn paginate<T: Clone>(list: &[T], requested_page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(list.len(), page_size);
    let page_number = clamp_page(requested_page, total_pages);

    let start = (page_number - 1) * page_size;
    let end = (page_number * page_size).min(list.len());
    let items = if start < end {
        list[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items,
        page_number,
        total_pages,
        total_items: list.len(),
    }
}

/// Page number after "previous"; no-op on the first page
pub fn previous_page(page_number: usize) -> usize {
    if page_number > 1 {
        page_number - 1
    } else {
        page_number
    }
}

/// Page number after "next"; no-op on the last page
pub fn next_page(page_number: usize, total_pages: usize) -> usize {
    if page_number < total_pages {
        page_number + 1
    } else {
        page_number
    }
}
