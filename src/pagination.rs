//! Page-window calculation for the upload history table.
//!
//! The window always shows the first and last page, the current page with one
//! neighbour on each side, and collapses the gaps into ellipses.

use std::fmt;
use std::ops::Range;

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Pages shown on each side of the current page.
pub const SIBLING_COUNT: u32 = 1;

/// Up to this many pages the full range is shown without ellipses.
const TOTAL_PAGE_NUMBERS: u32 = SIBLING_COUNT + 5;

/// Number of pages in the fixed block shown next to a single ellipsis.
const EDGE_BLOCK: u32 = 3 + 2 * SIBLING_COUNT;

/// Marker rendered in place of collapsed page ranges.
pub const ELLIPSIS: &str = "...";

/// A single navigation control: a concrete page or a collapsed gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

impl PageToken {
    pub fn page(&self) -> Option<u32> {
        match self {
            PageToken::Page(n) => Some(*n),
            PageToken::Ellipsis => None,
        }
    }
}

impl fmt::Display for PageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageToken::Page(n) => write!(f, "{}", n),
            PageToken::Ellipsis => f.pad(ELLIPSIS),
        }
    }
}

impl Serialize for PageToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageToken::Page(n) => serializer.serialize_u32(*n),
            PageToken::Ellipsis => serializer.serialize_str(ELLIPSIS),
        }
    }
}

impl<'de> Deserialize<'de> for PageToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Page(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Page(n) => Ok(PageToken::Page(n)),
            Raw::Text(s) if s == ELLIPSIS => Ok(PageToken::Ellipsis),
            Raw::Text(s) => Err(de::Error::invalid_value(
                Unexpected::Str(&s),
                &"a page number or \"...\"",
            )),
        }
    }
}

/// Compute the navigation tokens for `current_page` out of `total_pages`.
pub fn page_window(total_pages: u32, current_page: u32) -> Vec<PageToken> {
    if TOTAL_PAGE_NUMBERS >= total_pages {
        return (1..=total_pages).map(PageToken::Page).collect();
    }

    let left_sibling = current_page.saturating_sub(SIBLING_COUNT).max(1);
    let right_sibling = (current_page + SIBLING_COUNT).min(total_pages);

    let show_left_dots = left_sibling > 2;
    let show_right_dots = right_sibling < total_pages - 1;

    match (show_left_dots, show_right_dots) {
        (false, true) => {
            let mut tokens: Vec<PageToken> = (1..=EDGE_BLOCK).map(PageToken::Page).collect();
            tokens.push(PageToken::Ellipsis);
            tokens.push(PageToken::Page(total_pages));
            tokens
        }
        (true, false) => {
            let mut tokens = vec![PageToken::Page(1), PageToken::Ellipsis];
            tokens.extend((total_pages - EDGE_BLOCK + 1..=total_pages).map(PageToken::Page));
            tokens
        }
        (true, true) => {
            let mut tokens = vec![PageToken::Page(1), PageToken::Ellipsis];
            tokens.extend((left_sibling..=right_sibling).map(PageToken::Page));
            tokens.push(PageToken::Ellipsis);
            tokens.push(PageToken::Page(total_pages));
            tokens
        }
        // Unreachable for a current page inside 1..=total_pages.
        (false, false) => Vec::new(),
    }
}

/// Number of pages needed for `total_items` at `page_size` per page.
pub fn total_pages(total_items: usize, page_size: usize) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size) as u32
}

/// Current position within a paginated list.
///
/// `current_page` always stays within `1..=max(1, total_pages)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    current_page: u32,
    page_size: usize,
    total_items: usize,
}

impl Pagination {
    /// Start on page 1. A zero page size is bumped to 1.
    pub fn new(page_size: usize, total_items: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items,
        }
    }

    /// Start on `page` if it is valid, page 1 otherwise.
    pub fn at_page(page_size: usize, total_items: usize, page: u32) -> Self {
        let mut pagination = Self::new(page_size, total_items);
        pagination.paginate(page);
        pagination
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total_items, self.page_size)
    }

    /// Move to `target` if it is a valid page. Returns whether the page changed.
    pub fn paginate(&mut self, target: u32) -> bool {
        if target >= 1 && target <= self.total_pages() {
            let changed = self.current_page != target;
            self.current_page = target;
            changed
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(target) => self.paginate(target),
            None => false,
        }
    }

    pub fn next_page(&mut self) -> bool {
        self.paginate(self.current_page + 1)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Update the item count, pulling the current page back in range if needed.
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        let last = self.total_pages().max(1);
        if self.current_page > last {
            self.current_page = last;
        }
    }

    /// Index range of the items on the current page.
    pub fn item_range(&self) -> Range<usize> {
        let end = self.current_page as usize * self.page_size;
        let start = end - self.page_size;
        start.min(self.total_items)..end.min(self.total_items)
    }

    /// Items of `all` that fall on the current page.
    pub fn slice<'a, T>(&self, all: &'a [T]) -> &'a [T] {
        let range = self.item_range();
        &all[range.start.min(all.len())..range.end.min(all.len())]
    }

    /// Navigation tokens for the current page.
    pub fn window(&self) -> Vec<PageToken> {
        page_window(self.total_pages(), self.current_page)
    }
}
