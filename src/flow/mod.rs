//! # Flow Areas
//!
//! A flow area is a named region whose items continue from page to page.
//! Each area remembers where its items landed so that later pages resume
//! exactly where the previous page stopped, and so that the rendering pass
//! can replay placements without measuring anything again.
//!
//! [`FlowAreaCollection`] owns every area of one render and decides when the
//! document has converged: once no area has unplaced items, the final page
//! count is the largest last page across areas.

pub mod layout;

pub use layout::{FlowLayout, Placement, Subview, OFF_CANVAS};

use log::{debug, info};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The area name used when a flow node doesn't name one.
pub const DEFAULT_AREA: &str = "default";

/// Where one flow item was put: its size, its offset inside the area's
/// bounds, and the page it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedItem {
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub relative_x: f64,
    pub relative_y: f64,
    pub page_number: usize,
}

/// Placement state of a single flow area across both passes.
#[derive(Debug, Clone, Default)]
pub struct FlowArea {
    total_item_count: usize,
    placed_items: Vec<PlacedItem>,
    computed_pages: BTreeSet<usize>,
    final_page: Option<usize>,
}

impl FlowArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_item_count(&self) -> usize {
        self.total_item_count
    }

    /// Record how many items the area holds. The content tree is
    /// deterministic, so this is the same number on every page.
    pub fn set_total_item_count(&mut self, count: usize) {
        self.total_item_count = count;
    }

    /// Placements in index order, partitioned by ascending page.
    pub fn placed_items(&self) -> &[PlacedItem] {
        &self.placed_items
    }

    pub fn placed_count(&self) -> usize {
        self.placed_items.len()
    }

    pub fn has_unplaced_items(&self) -> bool {
        self.placed_items.len() < self.total_item_count
    }

    /// The page holding the last item, once every item is placed. Stays
    /// `None` for an area that never placed anything.
    pub fn final_page(&self) -> Option<usize> {
        self.final_page
    }

    pub fn is_page_computed(&self, page_number: usize) -> bool {
        self.computed_pages.contains(&page_number)
    }

    /// A page can be sized only once the page before it has been, because
    /// the first item of a page is wherever the previous page stopped.
    pub fn can_size_page(&self, page_number: usize) -> bool {
        page_number == 1 || (page_number > 1 && self.is_page_computed(page_number - 1))
    }

    /// The placement of item `index` on `page_number`, if it lives there.
    pub fn placement(&self, page_number: usize, index: usize) -> Option<&PlacedItem> {
        // Placements are sorted by index, and each index appears once.
        self.placed_items
            .get(index)
            .filter(|item| item.index == index && item.page_number == page_number)
    }

    pub fn items_on_page(&self, page_number: usize) -> impl Iterator<Item = &PlacedItem> {
        self.placed_items
            .iter()
            .filter(move |item| item.page_number == page_number)
    }

    pub(crate) fn push_placement(&mut self, item: PlacedItem) {
        debug_assert_eq!(item.index, self.placed_items.len());
        debug_assert!(self
            .placed_items
            .last()
            .map_or(true, |last| last.page_number <= item.page_number));
        self.placed_items.push(item);
    }

    pub(crate) fn mark_page_computed(&mut self, page_number: usize, placed_on_page: usize) {
        self.computed_pages.insert(page_number);
        if !self.has_unplaced_items() && placed_on_page > 0 {
            self.final_page = Some(page_number);
        }
    }
}

/// Bounded retry for reading the published page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 50,
            interval_ms: 10,
        }
    }
}

/// A cloneable read handle on the published final page count.
#[derive(Debug, Clone, Default)]
pub struct PageCountHandle {
    published: Arc<Mutex<Option<usize>>>,
}

impl PageCountHandle {
    pub fn get(&self) -> Option<usize> {
        *self.published.lock()
    }

    /// Poll until the count is visible or the policy runs out.
    pub fn wait(&self, policy: RetryPolicy) -> Option<usize> {
        for attempt in 0..policy.attempts.max(1) {
            if let Some(count) = self.get() {
                return Some(count);
            }
            if attempt + 1 < policy.attempts {
                thread::sleep(Duration::from_millis(policy.interval_ms));
            }
        }
        None
    }

    fn publish(&self, count: usize) {
        let mut slot = self.published.lock();
        if slot.is_none() {
            *slot = Some(count);
        }
    }
}

/// Every flow area of one render, keyed by name.
#[derive(Debug, Default)]
pub struct FlowAreaCollection {
    areas: BTreeMap<String, FlowArea>,
    sized_since_publish: bool,
    handle: PageCountHandle,
}

impl FlowAreaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the area called `name`, creating it on first access.
    pub fn area_mut(&mut self, name: &str) -> &mut FlowArea {
        self.areas.entry(name.to_string()).or_insert_with(|| {
            debug!("Registering flow area '{}'", name);
            FlowArea::new()
        })
    }

    pub fn area(&self, name: &str) -> Option<&FlowArea> {
        self.areas.get(name)
    }

    pub fn areas(&self) -> impl Iterator<Item = (&str, &FlowArea)> {
        self.areas.iter().map(|(name, area)| (name.as_str(), area))
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// True while any area still has items that were never placed.
    pub fn has_more_pages(&self) -> bool {
        self.areas.values().any(FlowArea::has_unplaced_items)
    }

    /// Note that an area finished sizing `page_number`.
    ///
    /// Convergence is not decided here: areas further down the page may not
    /// have registered yet. The check runs in [`publish_pending`], once the
    /// whole page is laid out.
    ///
    /// [`publish_pending`]: FlowAreaCollection::publish_pending
    pub fn report_area_sized(&mut self, page_number: usize) {
        debug!("Flow area sized page {}", page_number);
        self.sized_since_publish = true;
    }

    /// Publish the final page count if the page just laid out made every
    /// registered area converge. Once published the count never changes.
    pub fn publish_pending(&mut self) {
        if !std::mem::take(&mut self.sized_since_publish) || self.handle.get().is_some() {
            return;
        }
        if self.has_more_pages() {
            return;
        }

        let last_page = self
            .areas
            .values()
            .map(|area| area.final_page().unwrap_or(1))
            .fold(1, usize::max);
        info!("Publishing final page count {}", last_page);
        self.handle.publish(last_page);
    }

    pub fn final_page_count(&self) -> Option<usize> {
        self.handle.get()
    }

    pub fn page_count_handle(&self) -> PageCountHandle {
        self.handle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(index: usize, page_number: usize) -> PlacedItem {
        PlacedItem {
            index,
            width: 100.0,
            height: 10.0,
            relative_x: 0.0,
            relative_y: 0.0,
            page_number,
        }
    }

    fn finished_area(total: usize, last_page: usize) -> FlowArea {
        let mut area = FlowArea::new();
        area.set_total_item_count(total);
        for index in 0..total {
            area.push_placement(placed(index, last_page));
        }
        area.mark_page_computed(last_page, total);
        area
    }

    #[test]
    fn area_lookup_creates_once() {
        let mut collection = FlowAreaCollection::new();
        collection.area_mut("body").set_total_item_count(3);
        assert_eq!(collection.area_mut("body").total_item_count(), 3);
        assert_eq!(collection.areas().count(), 1);
    }

    #[test]
    fn placement_lookup_matches_page_and_index() {
        let mut area = FlowArea::new();
        area.set_total_item_count(2);
        area.push_placement(placed(0, 1));
        area.push_placement(placed(1, 2));
        assert!(area.placement(1, 0).is_some());
        assert!(area.placement(2, 0).is_none());
        assert!(area.placement(2, 1).is_some());
        assert!(area.placement(2, 5).is_none());
        assert_eq!(area.items_on_page(2).count(), 1);
    }

    #[test]
    fn sizing_an_empty_page_does_not_move_final_page() {
        let mut area = finished_area(2, 1);
        assert_eq!(area.final_page(), Some(1));
        area.mark_page_computed(2, 0);
        assert_eq!(area.final_page(), Some(1));
    }

    #[test]
    fn out_of_order_pages_cannot_be_sized() {
        let mut area = FlowArea::new();
        assert!(area.can_size_page(1));
        assert!(!area.can_size_page(0));
        assert!(!area.can_size_page(3));
        area.mark_page_computed(1, 0);
        assert!(area.can_size_page(2));
    }

    #[test]
    fn count_waits_for_every_area() {
        let mut collection = FlowAreaCollection::new();
        *collection.area_mut("a") = finished_area(2, 2);
        collection.area_mut("b").set_total_item_count(1);

        collection.report_area_sized(2);
        collection.publish_pending();
        assert_eq!(collection.final_page_count(), None);
        assert!(collection.has_more_pages());
    }

    #[test]
    fn count_waits_for_areas_registered_later_on_the_page() {
        let mut collection = FlowAreaCollection::new();
        // The first area in the tree finishes on page 1...
        *collection.area_mut("short") = finished_area(1, 1);
        collection.report_area_sized(1);
        // ...before a longer one further down the page registers.
        let long = collection.area_mut("long");
        long.set_total_item_count(8);
        long.push_placement(placed(0, 1));
        long.mark_page_computed(1, 1);
        collection.report_area_sized(1);

        collection.publish_pending();
        assert_eq!(collection.final_page_count(), None);

        let long = collection.area_mut("long");
        for index in 1..8 {
            long.push_placement(placed(index, 2));
        }
        long.mark_page_computed(2, 7);
        collection.report_area_sized(2);
        collection.publish_pending();
        assert_eq!(collection.final_page_count(), Some(2));
    }

    #[test]
    fn count_is_the_max_across_areas() {
        let mut collection = FlowAreaCollection::new();
        *collection.area_mut("a") = finished_area(2, 2);
        *collection.area_mut("b") = finished_area(5, 4);

        collection.report_area_sized(4);
        // Queued, not yet visible.
        assert_eq!(collection.final_page_count(), None);
        collection.publish_pending();
        assert_eq!(collection.final_page_count(), Some(4));
    }

    #[test]
    fn empty_area_counts_as_one_page() {
        let mut collection = FlowAreaCollection::new();
        collection.area_mut(DEFAULT_AREA).mark_page_computed(1, 0);
        collection.report_area_sized(1);
        collection.publish_pending();
        assert_eq!(collection.final_page_count(), Some(1));
    }

    #[test]
    fn published_count_is_never_revised() {
        let mut collection = FlowAreaCollection::new();
        *collection.area_mut("a") = finished_area(1, 2);
        collection.report_area_sized(2);
        collection.publish_pending();

        *collection.area_mut("a") = finished_area(1, 7);
        collection.report_area_sized(7);
        collection.publish_pending();
        assert_eq!(collection.final_page_count(), Some(2));
    }

    #[test]
    fn handle_wait_gives_up_after_the_policy() {
        let handle = PageCountHandle::default();
        let policy = RetryPolicy {
            attempts: 3,
            interval_ms: 1,
        };
        assert_eq!(handle.wait(policy), None);
        handle.publish(3);
        assert_eq!(handle.wait(policy), Some(3));
    }

    #[test]
    fn handle_sees_count_published_from_another_thread() {
        let handle = PageCountHandle::default();
        let writer = handle.clone();
        let join = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            writer.publish(6);
        });
        let count = handle.wait(RetryPolicy {
            attempts: 500,
            interval_ms: 2,
        });
        join.join().unwrap();
        assert_eq!(count, Some(6));
    }
}
