//! Per-render page bookkeeping shared by both passes.

/// Which page is being laid out, and how many pages the measuring pass found.
///
/// One instance exists per render. The driver calls [`start_new_page`] once
/// before every page layout in both passes, and [`reset_for_rendering`]
/// exactly once between them.
///
/// [`start_new_page`]: DocumentEnvironment::start_new_page
/// [`reset_for_rendering`]: DocumentEnvironment::reset_for_rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentEnvironment {
    page_number: usize,
    page_count: Option<usize>,
}

impl DocumentEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment pinned to one page, e.g. for laying out a single page
    /// outside of the renderer.
    pub fn at_page(page_number: usize, page_count: Option<usize>) -> Self {
        Self {
            page_number,
            page_count,
        }
    }

    /// The 1-based page currently being laid out, or 0 before the first page.
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// The page count determined by the measuring pass. `None` during pass 1.
    pub fn page_count(&self) -> Option<usize> {
        self.page_count
    }

    pub fn start_new_page(&mut self) {
        self.page_number += 1;
    }

    /// Freeze the measured page count and rewind for the rendering pass.
    ///
    /// Calling this before any page was started leaves the count unset, which
    /// the driver reports as a failed page count.
    pub fn reset_for_rendering(&mut self) {
        self.page_count = (self.page_number > 0).then_some(self.page_number);
        self.page_number = 0;
    }

    /// Replace the measured page count with the one the flow areas agreed on.
    pub(crate) fn settle_page_count(&mut self, page_count: usize) {
        self.page_count = Some(page_count);
    }
}
