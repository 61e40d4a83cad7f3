//! Client-side pagination and result gating.
//!
//! All of this is derived state: it is recomputed from the fetched result
//! list and the requested page, never stored. Anonymous sessions are capped
//! at [`MAX_FREE_RESULTS`] both when requesting and when displaying.

use crate::search::SearchResult;

/// Results shown per page.
pub const PAGE_SIZE: usize = 10;

/// Result cap for anonymous sessions.
pub const MAX_FREE_RESULTS: usize = 3;

/// Result cap requested for signed-in sessions.
pub const MAX_REGISTERED_RESULTS: usize = 50;

/// How many results to ask the search client for.
pub fn requested_results(signed_in: bool) -> usize {
    if signed_in {
        MAX_REGISTERED_RESULTS
    } else {
        MAX_FREE_RESULTS
    }
}

/// Applies the sign-in gate to a fetched result list.
///
/// Signed-in sessions see everything that came back; anonymous sessions are
/// truncated to [`MAX_FREE_RESULTS`] regardless of how many the endpoint
/// returned.
pub fn gate(results: &[SearchResult], signed_in: bool) -> &[SearchResult] {
    if signed_in {
        results
    } else {
        &results[..results.len().min(MAX_FREE_RESULTS)]
    }
}

/// Derived pagination state over a visible result count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based current page, clamped into `[1, total_pages]`.
    pub current_page: usize,
    /// Total pages; at least 1 even for zero results.
    pub total_pages: usize,
}

impl Pagination {
    /// Computes pagination for `visible` results and a requested page.
    pub fn compute(visible: usize, requested_page: usize) -> Self {
        let total_pages = visible.div_ceil(PAGE_SIZE).max(1);
        let current_page = requested_page.clamp(1, total_pages);
        Self {
            current_page,
            total_pages,
        }
    }

    /// Index range of the current page within the visible list.
    pub fn page_range(&self, visible: usize) -> std::ops::Range<usize> {
        let start = (self.current_page - 1) * PAGE_SIZE;
        let end = (start + PAGE_SIZE).min(visible);
        start.min(end)..end
    }

    /// Page numbers for the pagination bar: first, last, and current +/- 2,
    /// with `None` marking an ellipsis gap.
    pub fn page_numbers(&self) -> Vec<Option<usize>> {
        let mut out = Vec::new();
        let mut last_shown = 0usize;
        for page in 1..=self.total_pages {
            let keep = page == 1
                || page == self.total_pages
                || page.abs_diff(self.current_page) <= 2;
            if !keep {
                continue;
            }
            if last_shown != 0 && page != last_shown + 1 {
                out.push(None);
            }
            out.push(Some(page));
            last_shown = page;
        }
        out
    }

    /// The previous page, if any.
    pub fn prev(&self) -> Option<usize> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    /// The next page, if any.
    pub fn next(&self) -> Option<usize> {
        (self.current_page < self.total_pages).then(|| self.current_page + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results(n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| SearchResult {
                title: format!("result {i}"),
                snippet: String::new(),
                url: format!("https://example.com/{i}"),
            })
            .collect()
    }

    #[test]
    fn zero_results_is_one_page() {
        let p = Pagination::compute(0, 1);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.page_range(0), 0..0);
    }

    #[test]
    fn total_pages_is_ceil_of_count_over_page_size() {
        assert_eq!(Pagination::compute(1, 1).total_pages, 1);
        assert_eq!(Pagination::compute(10, 1).total_pages, 1);
        assert_eq!(Pagination::compute(11, 1).total_pages, 2);
        assert_eq!(Pagination::compute(50, 1).total_pages, 5);
    }

    #[test]
    fn requested_page_is_clamped() {
        assert_eq!(Pagination::compute(12, 0).current_page, 1);
        assert_eq!(Pagination::compute(12, 9).current_page, 2);
        assert_eq!(Pagination::compute(0, 7).current_page, 1);
    }

    #[test]
    fn twelve_results_split_ten_and_two() {
        let p1 = Pagination::compute(12, 1);
        assert_eq!(p1.page_range(12), 0..10);
        let p2 = Pagination::compute(12, 2);
        assert_eq!(p2.page_range(12), 10..12);
    }

    #[test]
    fn gate_truncates_anonymous_only() {
        let all = results(12);
        assert_eq!(gate(&all, true).len(), 12);
        assert_eq!(gate(&all, false).len(), MAX_FREE_RESULTS);

        let few = results(2);
        assert_eq!(gate(&few, false).len(), 2);
    }

    #[test]
    fn requested_results_depends_on_auth() {
        assert_eq!(requested_results(true), MAX_REGISTERED_RESULTS);
        assert_eq!(requested_results(false), MAX_FREE_RESULTS);
    }

    #[test]
    fn page_numbers_window_with_ellipsis() {
        let p = Pagination {
            current_page: 5,
            total_pages: 9,
        };
        assert_eq!(
            p.page_numbers(),
            vec![
                Some(1),
                None,
                Some(3),
                Some(4),
                Some(5),
                Some(6),
                Some(7),
                None,
                Some(9)
            ]
        );

        let small = Pagination {
            current_page: 1,
            total_pages: 2,
        };
        assert_eq!(small.page_numbers(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn prev_next_at_bounds() {
        let first = Pagination::compute(30, 1);
        assert_eq!(first.prev(), None);
        assert_eq!(first.next(), Some(2));

        let last = Pagination::compute(30, 3);
        assert_eq!(last.prev(), Some(2));
        assert_eq!(last.next(), None);
    }
}
