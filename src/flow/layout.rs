//! # Flow Pagination
//!
//! Greedy, page-at-a-time packing of a flow area's items.
//!
//! The first time a page is seen, the items that were not placed on earlier
//! pages are measured against the area's bounds and stacked top to bottom
//! until the next one would overflow. That assignment is recorded in the
//! [`FlowArea`](super::FlowArea) and never recomputed: every later placement
//! request for the same page, in either pass, replays it.
//!
//! Items that don't belong on the current page still get a position, far off
//! the page, so the caller can treat every item uniformly.

use log::debug;

use super::{FlowAreaCollection, PlacedItem};
use crate::geom::{Point, Rect, Size};

/// Where items that are not on the current page are parked. Far outside any
/// supported media box.
pub const OFF_CANVAS: Point = Point {
    x: 100_000.0,
    y: 100_000.0,
};

/// Something that can be stacked in a flow area.
pub trait Subview {
    /// The item's natural size when offered `proposal`.
    fn preferred_size(&self, proposal: Size) -> Size;
}

/// A fixed-size item ignores the proposal.
impl Subview for Size {
    fn preferred_size(&self, _proposal: Size) -> Size {
        *self
    }
}

/// The position of one flow item on the page being laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// The item belongs on this page, at `frame`.
    Visible { index: usize, frame: Rect },
    /// The item belongs to another page (or to none yet).
    OffCanvas { index: usize, origin: Point },
}

impl Placement {
    pub fn index(&self) -> usize {
        match self {
            Placement::Visible { index, .. } | Placement::OffCanvas { index, .. } => *index,
        }
    }

    pub fn frame(&self) -> Option<Rect> {
        match self {
            Placement::Visible { frame, .. } => Some(*frame),
            Placement::OffCanvas { .. } => None,
        }
    }
}

/// Pagination of one named flow area on one page.
pub struct FlowLayout<'a> {
    collection: &'a mut FlowAreaCollection,
    name: &'a str,
    page_number: usize,
}

impl<'a> FlowLayout<'a> {
    pub fn new(collection: &'a mut FlowAreaCollection, name: &'a str, page_number: usize) -> Self {
        Self {
            collection,
            name,
            page_number,
        }
    }

    /// Size the current page if that hasn't happened yet.
    ///
    /// Returns `false` when the page can't be sized because the previous
    /// page hasn't been; nothing is recorded in that case and a later call,
    /// after the earlier pages, will succeed.
    pub fn ensure_sized<S: Subview>(&mut self, bounds: Rect, subviews: &[S]) -> bool {
        let page = self.page_number;
        let area = self.collection.area_mut(self.name);
        area.set_total_item_count(subviews.len());

        if area.is_page_computed(page) {
            return true;
        }
        if !area.can_size_page(page) {
            debug!(
                "Flow area '{}': page {} requested before page {} was sized, skipping",
                self.name,
                page,
                page.saturating_sub(1)
            );
            return false;
        }

        self.size_current_page(bounds, subviews);
        true
    }

    fn size_current_page<S: Subview>(&mut self, bounds: Rect, subviews: &[S]) {
        let page = self.page_number;
        debug!("Flow area '{}': calculating page {}", self.name, page);

        let area = self.collection.area_mut(self.name);
        let first_unplaced = area.placed_count();
        let mut total_height = 0.0;
        let mut placed_on_page = 0;

        for (index, subview) in subviews.iter().enumerate().skip(first_unplaced) {
            let preferred = subview.preferred_size(bounds.size);
            debug!(
                "Preferred size of item {}: {:.1} x {:.1}",
                index, preferred.width, preferred.height
            );

            // The first item always goes on the page, even if it overflows:
            // later pages won't be any taller.
            if placed_on_page > 0 && total_height + preferred.height > bounds.height() {
                debug!("Too tall; ending calculation for page {}", page);
                break;
            }

            area.push_placement(PlacedItem {
                index,
                width: preferred.width,
                height: preferred.height,
                relative_x: 0.0,
                relative_y: total_height,
                page_number: page,
            });
            placed_on_page += 1;
            total_height += preferred.height;
        }

        area.mark_page_computed(page, placed_on_page);
        self.collection.report_area_sized(page);
    }

    /// Position every item for the current page, sizing the page first if
    /// needed. Safe to call any number of times.
    pub fn place<S: Subview>(&mut self, bounds: Rect, subviews: &[S]) -> Vec<Placement> {
        self.ensure_sized(bounds, subviews);

        let page = self.page_number;
        let area = self.collection.area_mut(self.name);
        let placements: Vec<Placement> = (0..subviews.len())
            .map(|index| match area.placement(page, index) {
                Some(item) => Placement::Visible {
                    index,
                    frame: Rect::new(
                        bounds.x() + item.relative_x,
                        bounds.y() + item.relative_y,
                        item.width,
                        item.height,
                    ),
                },
                None => Placement::OffCanvas {
                    index,
                    origin: OFF_CANVAS,
                },
            })
            .collect();

        for placement in &placements {
            if let Placement::Visible { index, frame } = placement {
                debug!(
                    "Page {}: placing item {} at {:.0},{:.0} with size {:.0} x {:.0}",
                    page,
                    index,
                    frame.x(),
                    frame.y(),
                    frame.width(),
                    frame.height()
                );
            }
        }

        placements
    }
}
