use std::collections::HashSet;

use tracing::{debug, warn};

use super::data::{Item, ItemId, Page};
use crate::error::Result;

/// Which kind of load a page request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// First page; replaces everything that was loaded before
    Initial,
    /// Next page; appended to the current items
    More,
}

/// A page fetch the gallery has agreed to start.
///
/// Handed back to [`Gallery::finish_page`] together with the fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub kind: LoadKind,
    generation: u64,
}

/// What applying a page did to the gallery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Applied {
        /// Ids that were new and got appended, in load order
        appended: Vec<ItemId>,
        /// Items dropped because their id was already loaded
        duplicates: usize,
    },
    /// The gallery was reset while the request was in flight
    Discarded,
}

/// Ticket returned by an optimistic delete, used to roll it back
#[derive(Debug, Clone, PartialEq)]
pub struct Removed {
    pub index: usize,
    pub item: Item,
    generation: u64,
}

/// Step direction through the loaded items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Scroll position of the grid, as reported by the scrollable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset_y: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ScrollMetrics {
    /// Whether the bottom of the viewport is within `threshold` of the content end
    pub fn near_bottom(&self, threshold: f32) -> bool {
        self.offset_y + self.viewport_height >= self.content_height - threshold
    }
}

/// Single source of truth for loaded items, selection and paging.
///
/// Network calls happen outside: `begin_*` hands out a [`PageRequest`]
/// (or `None` when the in-flight guard or exhaustion forbids a fetch),
/// and `finish_page` applies the result.
#[derive(Debug)]
pub struct Gallery {
    items: Vec<Item>,
    ids: HashSet<ItemId>,
    /// Selected ids in the order they were selected
    selected: Vec<ItemId>,
    cursor: u32,
    has_more: bool,
    in_flight: bool,
    page_size: u32,
    generation: u64,
}

impl Gallery {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            selected: Vec::new(),
            cursor: 1,
            has_more: true,
            in_flight: false,
            page_size: page_size.max(1),
            generation: 0,
        }
    }

    // ========== Paging ==========

    /// Start loading page 1. Returns `None` while any load is in flight.
    pub fn begin_initial(&mut self) -> Option<PageRequest> {
        if self.in_flight {
            debug!("Initial load ignored, a load is already in flight");
            return None;
        }

        self.in_flight = true;
        Some(PageRequest {
            page: 1,
            limit: self.page_size,
            kind: LoadKind::Initial,
            generation: self.generation,
        })
    }

    /// Start loading the page at the cursor.
    ///
    /// Returns `None` while a load is in flight or once the source is exhausted.
    pub fn begin_more(&mut self) -> Option<PageRequest> {
        if self.in_flight || !self.has_more {
            return None;
        }

        self.in_flight = true;
        Some(PageRequest {
            page: self.cursor,
            limit: self.page_size,
            kind: LoadKind::More,
            generation: self.generation,
        })
    }

    /// Scroll-proximity trigger for infinite scrolling
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, threshold: f32) -> Option<PageRequest> {
        if metrics.near_bottom(threshold) {
            self.begin_more()
        } else {
            None
        }
    }

    /// Apply the result of a fetch started by `begin_initial` or `begin_more`.
    ///
    /// Errors are handed back untouched; the cursor only moves on success.
    pub fn finish_page(&mut self, request: PageRequest, result: Result<Page>) -> Result<PageOutcome> {
        if request.generation != self.generation {
            debug!(page = request.page, "Discarding page from before reset");
            return Ok(PageOutcome::Discarded);
        }

        self.in_flight = false;
        let page = result.inspect_err(|err| warn!(page = request.page, "Page load failed: {}", err))?;

        if request.kind == LoadKind::Initial {
            self.items.clear();
            self.ids.clear();
            self.selected.clear();
        }

        let mut appended = Vec::new();
        let mut duplicates = 0;
        for item in page.images {
            if self.ids.insert(item.id.clone()) {
                appended.push(item.id.clone());
                self.items.push(item);
            } else {
                duplicates += 1;
            }
        }

        self.cursor = request.page + 1;
        self.has_more = page.has_more;

        debug!(
            page = request.page,
            appended = appended.len(),
            duplicates,
            has_more = self.has_more,
            "Page applied"
        );

        Ok(PageOutcome::Applied { appended, duplicates })
    }

    /// Back to the empty state; responses to earlier requests are discarded
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self::new(self.page_size);
        self.generation = generation;
    }

    // ========== Selection ==========

    /// Flip selection of a loaded item. Returns whether it is now selected.
    pub fn toggle_selection(&mut self, id: &ItemId) -> bool {
        if !self.ids.contains(id) {
            return false;
        }

        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(id.clone());
            true
        }
    }

    /// Add a loaded item to the selection (long-press). Never deselects.
    pub fn start_selection(&mut self, id: &ItemId) {
        if self.ids.contains(id) && !self.is_selected(id) {
            self.selected.push(id.clone());
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selection_mode(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_ids(&self) -> &[ItemId] {
        &self.selected
    }

    // ========== Deletion ==========

    /// Optimistically drop an item and its selection entry
    pub fn remove(&mut self, id: &ItemId) -> Option<Removed> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        let item = self.items.remove(index);
        self.ids.remove(id);
        self.selected.retain(|s| s != id);

        Some(Removed {
            index,
            item,
            generation: self.generation,
        })
    }

    /// Undo a `remove` whose remote delete failed.
    ///
    /// Returns `false` if the id has been loaded again in the meantime or
    /// the gallery was reset since the removal.
    pub fn restore(&mut self, removed: Removed) -> bool {
        if removed.generation != self.generation {
            debug!(id = %removed.item.id, "Not restoring an item removed before reset");
            return false;
        }
        if self.ids.contains(&removed.item.id) {
            return false;
        }

        let index = removed.index.min(self.items.len());
        self.ids.insert(removed.item.id.clone());
        self.items.insert(index, removed.item);
        true
    }

    // ========== Accessors ==========

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Item next to `id` in load order; `None` at either end or for unknown ids
    pub fn neighbour(&self, id: &ItemId, direction: Direction) -> Option<&Item> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        match direction {
            Direction::Previous => index.checked_sub(1).and_then(|i| self.items.get(i)),
            Direction::Next => self.items.get(index + 1),
        }
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn is_exhausted(&self) -> bool {
        !self.has_more
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GalleryError;
    use crate::source::mock::MockSource;
    use crate::source::Source;
    use std::time::Duration;

    fn mock(total: usize) -> MockSource {
        MockSource::new(total, Duration::ZERO)
    }

    async fn run(gallery: &mut Gallery, source: &Source, request: PageRequest) -> Result<PageOutcome> {
        let result = source.list_images(request.page, request.limit).await;
        gallery.finish_page(request, result)
    }

    fn page(ids: &[&str], has_more: bool) -> Page {
        Page {
            images: ids.iter().map(|id| Item::new(*id, format!("mock://{id}"))).collect(),
            has_more,
        }
    }

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    #[tokio::test]
    async fn test_initial_then_more_exhausts_corpus() {
        let source = Source::Mock(mock(20));
        let mut gallery = Gallery::new(12);

        let request = gallery.begin_initial().unwrap();
        run(&mut gallery, &source, request).await.unwrap();

        assert_eq!(gallery.items().len(), 12);
        assert!(gallery.has_more());
        assert_eq!(gallery.cursor(), 2);

        let request = gallery.begin_more().unwrap();
        assert_eq!(request.page, 2);
        run(&mut gallery, &source, request).await.unwrap();

        assert_eq!(gallery.items().len(), 20);
        assert!(!gallery.has_more());
        assert!(gallery.is_exhausted());
    }

    #[tokio::test]
    async fn test_initial_load_is_guarded() {
        let mock = mock(20);
        let source = Source::Mock(mock.clone());
        let mut gallery = Gallery::new(12);

        let first = gallery.begin_initial();
        let second = gallery.begin_initial();
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(gallery.begin_more().is_none());

        run(&mut gallery, &source, first.unwrap()).await.unwrap();

        assert_eq!(mock.list_calls(), 1);
        assert_eq!(gallery.items().len(), 12);
        assert!(!gallery.is_loading());
    }

    #[test]
    fn test_initial_load_replaces_previous_state() {
        let mut gallery = Gallery::new(2);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b"], true))).unwrap();
        gallery.toggle_selection(&id("a"));

        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["c"], false))).unwrap();

        let ids: Vec<_> = gallery.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["c"]);
        assert!(!gallery.is_selection_mode());
        assert_eq!(gallery.cursor(), 2);
    }

    #[test]
    fn test_more_drops_duplicates_first_seen_wins() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], true))).unwrap();

        let mut overlapping = page(&["c", "d", "a", "e"], true);
        overlapping.images[0].description = Some("later copy".to_string());

        let request = gallery.begin_more().unwrap();
        let outcome = gallery.finish_page(request, Ok(overlapping)).unwrap();

        assert_eq!(
            outcome,
            PageOutcome::Applied {
                appended: vec![id("d"), id("e")],
                duplicates: 2,
            }
        );
        let ids: Vec<_> = gallery.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
        assert_eq!(gallery.item(&id("c")).unwrap().description, None);
    }

    #[test]
    fn test_items_grow_monotonically_without_duplicates() {
        let mut gallery = Gallery::new(4);
        let pages = [
            page(&["1", "2", "3", "4"], true),
            page(&["4", "5", "6", "7"], true),
            page(&["7", "8", "1", "9"], true),
            page(&["9", "10"], false),
        ];

        let request = gallery.begin_initial().unwrap();
        let mut pages = pages.into_iter();
        gallery.finish_page(request, Ok(pages.next().unwrap())).unwrap();

        let mut previous = gallery.items().len();
        for next in pages {
            let request = gallery.begin_more().unwrap();
            gallery.finish_page(request, Ok(next)).unwrap();

            let len = gallery.items().len();
            assert!(len >= previous);
            previous = len;

            let unique: HashSet<_> = gallery.items().iter().map(|i| &i.id).collect();
            assert_eq!(unique.len(), len);
        }
        assert_eq!(previous, 10);
    }

    #[test]
    fn test_exhausted_more_is_noop() {
        let mut gallery = Gallery::new(2);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b"], false))).unwrap();
        gallery.start_selection(&id("a"));

        let items_before = gallery.items().to_vec();
        let cursor_before = gallery.cursor();

        for _ in 0..3 {
            assert!(gallery.begin_more().is_none());
        }
        let metrics = ScrollMetrics {
            offset_y: 1000.0,
            viewport_height: 500.0,
            content_height: 1500.0,
        };
        assert!(gallery.on_scroll(metrics, 200.0).is_none());

        assert_eq!(gallery.items(), items_before.as_slice());
        assert_eq!(gallery.cursor(), cursor_before);
        assert_eq!(gallery.selected_ids(), &[id("a")]);
        assert!(!gallery.is_loading());
    }

    #[test]
    fn test_failed_fetch_keeps_cursor() {
        let mut gallery = Gallery::new(2);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b"], true))).unwrap();

        let request = gallery.begin_more().unwrap();
        let err = gallery
            .finish_page(request, Err(GalleryError::Network("timeout".into())))
            .unwrap_err();

        assert!(matches!(err, GalleryError::Network(_)));
        assert_eq!(gallery.cursor(), 2);
        assert!(!gallery.is_loading());
        assert_eq!(gallery.begin_more().unwrap().page, 2);
    }

    #[test]
    fn test_scroll_trigger_respects_threshold_and_guard() {
        let mut gallery = Gallery::new(2);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b"], true))).unwrap();

        let far = ScrollMetrics {
            offset_y: 0.0,
            viewport_height: 600.0,
            content_height: 2000.0,
        };
        assert!(gallery.on_scroll(far, 200.0).is_none());

        let close = ScrollMetrics {
            offset_y: 1250.0,
            viewport_height: 600.0,
            content_height: 2000.0,
        };
        assert!(gallery.on_scroll(close, 200.0).is_some());
        assert!(gallery.on_scroll(close, 200.0).is_none());
    }

    #[test]
    fn test_selection_operations() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], false))).unwrap();

        assert!(!gallery.is_selection_mode());
        assert!(gallery.toggle_selection(&id("b")));
        gallery.start_selection(&id("a"));
        gallery.start_selection(&id("a"));
        assert_eq!(gallery.selected_ids(), &[id("b"), id("a")]);
        assert!(gallery.is_selection_mode());

        assert!(!gallery.toggle_selection(&id("b")));
        assert!(!gallery.toggle_selection(&id("zzz")));
        gallery.start_selection(&id("zzz"));
        assert_eq!(gallery.selected_ids(), &[id("a")]);

        gallery.deselect_all();
        assert!(!gallery.is_selection_mode());
    }

    #[test]
    fn test_remove_prunes_selection_and_blocks_toggle() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], false))).unwrap();
        gallery.toggle_selection(&id("a"));
        gallery.toggle_selection(&id("b"));

        let removed = gallery.remove(&id("b")).unwrap();
        assert_eq!(removed.index, 1);
        assert_eq!(gallery.selected_ids(), &[id("a")]);

        gallery.toggle_selection(&id("b"));
        assert_eq!(gallery.selected_ids(), &[id("a")]);
        assert!(gallery.remove(&id("b")).is_none());
    }

    #[test]
    fn test_restore_puts_item_back() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], true))).unwrap();

        let removed = gallery.remove(&id("b")).unwrap();
        assert!(gallery.restore(removed.clone()));
        let ids: Vec<_> = gallery.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);

        // Already back, a second restore must not duplicate it
        assert!(!gallery.restore(removed));
        assert_eq!(gallery.items().len(), 3);
    }

    #[test]
    fn test_restore_after_reset_is_refused() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], true))).unwrap();
        let removed = gallery.remove(&id("b")).unwrap();

        gallery.reset();
        assert!(!gallery.restore(removed.clone()));
        assert!(gallery.items().is_empty());

        // Signed back in with a fresh first page; the old ticket still must not land
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["x", "y"], false))).unwrap();
        assert!(!gallery.restore(removed));
        let ids: Vec<_> = gallery.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["x", "y"]);
    }

    #[test]
    fn test_neighbour_stops_at_both_ends() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], true))).unwrap();

        let step = |from: &str, direction| gallery.neighbour(&id(from), direction).map(|i| i.id.as_str());
        assert_eq!(step("a", Direction::Previous), None);
        assert_eq!(step("a", Direction::Next), Some("b"));
        assert_eq!(step("b", Direction::Previous), Some("a"));
        assert_eq!(step("c", Direction::Next), None);
        assert_eq!(step("zzz", Direction::Next), None);
    }

    #[test]
    fn test_neighbour_skips_removed_item() {
        let mut gallery = Gallery::new(3);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b", "c"], false))).unwrap();
        gallery.remove(&id("b"));

        let next = gallery.neighbour(&id("a"), Direction::Next).unwrap();
        assert_eq!(next.id, id("c"));
    }

    #[test]
    fn test_delete_during_load_more() {
        let mut gallery = Gallery::new(2);
        let request = gallery.begin_initial().unwrap();
        gallery.finish_page(request, Ok(page(&["a", "b"], true))).unwrap();

        let request = gallery.begin_more().unwrap();
        gallery.remove(&id("a"));
        gallery.finish_page(request, Ok(page(&["c", "d"], true))).unwrap();

        let ids: Vec<_> = gallery.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "d"]);
    }

    #[test]
    fn test_reset_discards_in_flight_response() {
        let mut gallery = Gallery::new(2);
        let request = gallery.begin_initial().unwrap();

        gallery.reset();
        let outcome = gallery.finish_page(request, Ok(page(&["a"], false))).unwrap();

        assert_eq!(outcome, PageOutcome::Discarded);
        assert!(gallery.items().is_empty());
        assert!(gallery.has_more());
        assert_eq!(gallery.cursor(), 1);
        assert!(gallery.begin_initial().is_some());
    }
}
