//! The pagination planner. Listing pages, tag pages and static-path
//! enumeration all split their (already sorted) items with the functions
//! here.

use serde::Serialize;
use std::fmt;
use std::ops::{Range, RangeInclusive};

/// The default number of posts per listing page.
pub const POSTS_PER_PAGE: usize = 5;

/// The pagination state of a listing page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The 1-based page number.
    pub current_page: usize,
    pub total_pages: usize,
}

/// A valid page of a listing: which items it holds and where it sits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    /// The item offsets on this page, `[size * (page - 1), size * page)`
    /// clamped to the item count.
    pub range: Range<usize>,
    pub pagination: Pagination,
}

impl PageWindow {
    /// The items on this page. `items` must be the full sequence the window
    /// was planned for.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.range.end.min(items.len());
        &items[self.range.start.min(end)..end]
    }
}

/// Returned for a page that doesn't exist. Consumers render a not-found
/// response for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotFound;

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("page not found")
    }
}

impl std::error::Error for NotFound {}

/// The number of pages needed for `item_count` items; zero when there are no
/// items.
pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    match page_size {
        0 => 0,
        _ => item_count.div_ceil(page_size),
    }
}

/// Plans page `requested` (1-based) of a listing. Pages outside
/// `1..=total_pages` are [`NotFound`], which includes every page of an empty
/// listing.
pub fn paginate(item_count: usize, page_size: usize, requested: u64) -> Result<PageWindow, NotFound> {
    let total = total_pages(item_count, page_size);
    let page = usize::try_from(requested).map_err(|_| NotFound)?;
    if page < 1 || page > total {
        return Err(NotFound);
    }
    Ok(window(item_count, page_size, page, total))
}

/// Every page of a listing in order, as [`paginate`] would plan them. An
/// empty listing has no pages.
pub fn windows(item_count: usize, page_size: usize) -> impl Iterator<Item = PageWindow> {
    let total = total_pages(item_count, page_size);
    (1..=total).map(move |page| window(item_count, page_size, page, total))
}

/// `page` must lie in `1..=total`.
fn window(item_count: usize, page_size: usize, page: usize, total: usize) -> PageWindow {
    let start = page_size * (page - 1);
    PageWindow {
        range: start..start.saturating_add(page_size).min(item_count),
        pagination: Pagination {
            current_page: page,
            total_pages: total,
        },
    }
}

/// Like [`paginate`], but for a page number taken from a request path.
/// Anything that isn't a positive integer is [`NotFound`].
pub fn paginate_str(item_count: usize, page_size: usize, requested: &str) -> Result<PageWindow, NotFound> {
    let requested = requested.trim().parse::<u64>().map_err(|_| NotFound)?;
    paginate(item_count, page_size, requested)
}

/// The page numbers to generate static paths for: one per valid page.
pub fn page_numbers(item_count: usize, page_size: usize) -> RangeInclusive<usize> {
    1..=total_pages(item_count, page_size)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(0, total_pages(0, 5));
        assert_eq!(1, total_pages(1, 5));
        assert_eq!(1, total_pages(5, 5));
        assert_eq!(2, total_pages(6, 5));
        assert_eq!(3, total_pages(12, 5));
        assert_eq!(0, total_pages(12, 0));
        assert_eq!(1, total_pages(3, usize::MAX));
        assert_eq!(1, total_pages(usize::MAX, usize::MAX));
    }

    #[test]
    fn test_huge_page_size() -> Result<(), NotFound> {
        let window = paginate(3, usize::MAX, 1)?;
        assert_eq!(0..3, window.range);
        assert_eq!(1, window.pagination.total_pages);
        Ok(())
    }

    #[test]
    fn test_empty_listing_has_no_pages() {
        assert_eq!(Err(NotFound), paginate(0, 5, 1));
        assert_eq!(0, page_numbers(0, 5).count());
    }

    #[test]
    fn test_last_partial_page() -> Result<(), NotFound> {
        let window = paginate(12, 5, 3)?;
        assert_eq!(10..12, window.range);
        assert_eq!(
            Pagination {
                current_page: 3,
                total_pages: 3
            },
            window.pagination
        );
        Ok(())
    }

    #[test]
    fn test_first_page() -> Result<(), NotFound> {
        assert_eq!(0..5, paginate(12, 5, 1)?.range);
        Ok(())
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(Err(NotFound), paginate(12, 5, 4));
        assert_eq!(Err(NotFound), paginate(12, 5, 0));
        assert_eq!(Err(NotFound), paginate(12, 0, 1));
        assert_eq!(Err(NotFound), paginate(12, 5, u64::MAX));
    }

    #[test]
    fn test_paginate_str() -> Result<(), NotFound> {
        assert_eq!(5..10, paginate_str(12, 5, "2")?.range);
        assert_eq!(5..10, paginate_str(12, 5, " 2 ")?.range);
        assert_eq!(Err(NotFound), paginate_str(12, 5, "two"));
        assert_eq!(Err(NotFound), paginate_str(12, 5, "-1"));
        assert_eq!(Err(NotFound), paginate_str(12, 5, "2.5"));
        assert_eq!(Err(NotFound), paginate_str(12, 5, ""));
        Ok(())
    }

    #[test]
    fn test_slice() -> Result<(), NotFound> {
        let items: Vec<usize> = (0..12).collect();
        assert_eq!(&[10, 11], paginate(items.len(), 5, 3)?.slice(&items));
        assert_eq!(&[0, 1, 2, 3, 4], paginate(items.len(), 5, 1)?.slice(&items));
        Ok(())
    }

    #[test]
    fn test_page_numbers() {
        assert_eq!(vec![1, 2, 3], page_numbers(12, 5).collect::<Vec<_>>());
        assert_eq!(vec![1], page_numbers(5, 5).collect::<Vec<_>>());
    }

    #[test]
    fn test_windows() -> Result<(), NotFound> {
        let all: Vec<PageWindow> = windows(12, 5).collect();
        assert_eq!(3, all.len());
        for (i, window) in all.iter().enumerate() {
            assert_eq!(&paginate(12, 5, i as u64 + 1)?, window);
        }
        assert_eq!(0, windows(0, 5).count());
        assert_eq!(0, windows(12, 0).count());
        Ok(())
    }
}
