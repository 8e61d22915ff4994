//! Pagination range synthesis
//!
//! Pure function producing the compact list of page links shown under a
//! paged view: a window of pages around the current one, the first and last
//! pages, and an ellipsis wherever a gap of more than one page is skipped.

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Default number of pages shown on each side of the current page.
pub const DEFAULT_WINDOW_SIZE: usize = 2;

/// A single entry of the pagination strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageToken {
    /// A 1-based page number.
    Number(usize),
    /// A gap of skipped pages.
    Ellipsis,
}

impl PageToken {
    /// Zero-based page index this token navigates to, if any.
    pub fn page_index(&self) -> Option<usize> {
        match self {
            PageToken::Number(n) => n.checked_sub(1),
            PageToken::Ellipsis => None,
        }
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageToken::Number(n) => write!(f, "{n}"),
            PageToken::Ellipsis => write!(f, "..."),
        }
    }
}

// Numbers serialize as JSON numbers and the gap as the literal "...".
impl Serialize for PageToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PageToken::Number(n) => serializer.serialize_u64(*n as u64),
            PageToken::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// Compute the pagination strip for a view.
///
/// # Arguments
/// * `current_page` - 1-based page currently displayed
/// * `total_pages` - number of pages reported by the last successful fetch
/// * `window_size` - pages shown on each side of `current_page`
///
/// # Returns
/// The ordered tokens to render. Every `Number(n)` satisfies
/// `1 <= n <= total_pages` and two `Ellipsis` tokens are never adjacent.
/// A negative `total_pages` or `window_size` is a caller bug and yields
/// `Error::InvalidRange` instead of being clamped.
pub fn compute_range(
    current_page: i64,
    total_pages: i64,
    window_size: i64,
) -> Result<Vec<PageToken>> {
    if total_pages < 0 || window_size < 0 {
        return Err(Error::InvalidRange {
            total_pages,
            window_size,
        });
    }

    let mut range_start = current_page.saturating_sub(window_size);
    let mut range_end = current_page.saturating_add(window_size);

    if range_end > total_pages {
        range_end = total_pages;
        range_start = total_pages.saturating_sub(window_size.saturating_mul(2)).max(1);
    }

    if range_start <= 1 {
        range_start = 1;
        range_end = window_size.saturating_mul(2).saturating_add(1).min(total_pages);
    }

    let mut tokens = Vec::new();

    if range_start <= 3 {
        tokens.extend((1..range_start).map(page));
    } else {
        tokens.push(PageToken::Number(1));
        tokens.push(PageToken::Ellipsis);
    }

    tokens.extend((range_start..=range_end).map(page));

    if range_end >= total_pages - 2 {
        tokens.extend((range_end + 1..=total_pages).map(page));
    } else {
        tokens.push(PageToken::Ellipsis);
        tokens.push(PageToken::Number(total_pages as usize));
    }

    Ok(tokens)
}

fn page(n: i64) -> PageToken {
    PageToken::Number(n as usize)
}
