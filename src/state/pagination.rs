/// Incremental window over the filtered result sequence
///
/// The grid shows the first page and appends a page per "load more"
/// press; nothing already shown is re-rendered. Any criteria change
/// resets the window to zero before recomputing.

use std::ops::Range;

/// Results are appended in fixed pages of this size.
pub const PAGE_SIZE: usize = 50;

/// Monotonic cursor into a fully-materialized filtered sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageWindow {
    displayed: usize,
}

impl PageWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many results are currently visible.
    pub fn displayed(&self) -> usize {
        self.displayed
    }

    /// Discard the window; the next `load_more` starts from the top.
    pub fn reset(&mut self) {
        self.displayed = 0;
    }

    /// Advance the cursor by up to one page and return the newly visible
    /// range of the filtered sequence.
    pub fn load_more(&mut self, total: usize) -> Range<usize> {
        let end = (self.displayed + PAGE_SIZE).min(total);
        let range = self.displayed..end;
        self.displayed = end;
        range
    }

    /// Whether another page remains beyond the cursor.
    pub fn has_more(&self, total: usize) -> bool {
        self.displayed < total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_cover_exactly_n_items() {
        let total = 123;
        let mut window = PageWindow::new();
        let mut seen = Vec::new();
        let mut calls = 0;

        while window.has_more(total) {
            let range = window.load_more(total);
            seen.extend(range);
            calls += 1;
        }

        // ceil(123 / 50) pages, no duplicates, no gaps
        assert_eq!(calls, 3);
        assert_eq!(seen, (0..total).collect::<Vec<_>>());
        assert!(!window.has_more(total));
    }

    #[test]
    fn test_reset_discards_progress() {
        let mut window = PageWindow::new();
        window.load_more(80);
        assert_eq!(window.displayed(), 50);

        window.reset();
        assert_eq!(window.displayed(), 0);
        assert_eq!(window.load_more(80), 0..50);
    }

    #[test]
    fn test_short_final_page() {
        let mut window = PageWindow::new();
        assert_eq!(window.load_more(60), 0..50);
        assert_eq!(window.load_more(60), 50..60);
        assert!(!window.has_more(60));
        // Further calls are empty, not panicking
        assert_eq!(window.load_more(60), 60..60);
    }

    #[test]
    fn test_empty_result_set() {
        let mut window = PageWindow::new();
        assert!(!window.has_more(0));
        assert_eq!(window.load_more(0), 0..0);
    }
}
