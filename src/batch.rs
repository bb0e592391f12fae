/// Sequential batch downloads
///
/// A `BatchDownload` hands out one item at a time. The caller performs
/// the download, reports the result with `record`, waits for `pause()`
/// and asks for the next step. Ids are resolved against the gallery at
/// the moment they come up, so an item deleted mid-batch is skipped.
use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::GalleryError;
use crate::state::data::{Item, ItemId};

/// Default pause between two downloads
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

/// Progress signals for the notification layer
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started { total: usize },
    ItemFailed { id: ItemId, error: GalleryError },
    Finished(BatchSummary),
}

/// Final tally of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub requested: usize,
    pub downloaded: usize,
    pub failed: usize,
    /// Ids that no longer resolved to a loaded item
    pub skipped: usize,
    pub cancelled: bool,
}

/// How `record` treated a download result
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    /// Not the item the batch is waiting on; nothing changed
    Stale,
    /// Counted. Carries the failure event when the download failed.
    Counted(Option<BatchEvent>),
}

/// What the caller should do next
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Download(Item),
    Finished(BatchSummary),
}

#[derive(Debug)]
pub struct BatchDownload {
    queue: VecDeque<ItemId>,
    pacing: Duration,
    summary: BatchSummary,
    current: Option<ItemId>,
}

impl BatchDownload {
    /// Start a batch over `ids` in the given order
    pub fn start(ids: Vec<ItemId>, pacing: Duration) -> (Self, BatchEvent) {
        let total = ids.len();
        info!(total, "Starting batch download");

        let batch = Self {
            queue: ids.into(),
            pacing,
            summary: BatchSummary {
                requested: total,
                ..BatchSummary::default()
            },
            current: None,
        };

        (batch, BatchEvent::Started { total })
    }

    /// Next item to download, or the summary once the queue is drained.
    ///
    /// Ids `resolve` cannot find are skipped.
    pub fn next(&mut self, resolve: impl Fn(&ItemId) -> Option<Item>) -> Step {
        while !self.summary.cancelled {
            let Some(id) = self.queue.pop_front() else {
                break;
            };

            match resolve(&id) {
                Some(item) => {
                    debug!(id = %id, "Batch item ready");
                    self.current = Some(id);
                    return Step::Download(item);
                }
                None => {
                    warn!(id = %id, "Skipping batch item that is no longer loaded");
                    self.summary.skipped += 1;
                }
            }
        }

        self.current = None;
        info!(
            downloaded = self.summary.downloaded,
            failed = self.summary.failed,
            skipped = self.summary.skipped,
            cancelled = self.summary.cancelled,
            "Batch download finished"
        );
        Step::Finished(self.summary.clone())
    }

    /// Record the outcome of the download handed out by `next`.
    ///
    /// Failures are reported but do not stop the batch. A result for any
    /// other id is `Stale` and must not advance the batch.
    pub fn record(&mut self, id: &ItemId, result: Result<(), GalleryError>) -> Recorded {
        if self.current.as_ref() != Some(id) {
            warn!(id = %id, "Ignoring result for an item the batch is not waiting on");
            return Recorded::Stale;
        }
        self.current = None;

        match result {
            Ok(()) => {
                self.summary.downloaded += 1;
                Recorded::Counted(None)
            }
            Err(error) => {
                warn!(id = %id, "Batch item failed: {}", error);
                self.summary.failed += 1;
                Recorded::Counted(Some(BatchEvent::ItemFailed {
                    id: id.clone(),
                    error,
                }))
            }
        }
    }

    /// How long to wait before the next step; `None` when nothing is left
    pub fn pause(&self) -> Option<Duration> {
        if self.queue.is_empty() || self.summary.cancelled {
            None
        } else {
            Some(self.pacing)
        }
    }

    /// Stop before the next item. The item in progress still completes.
    pub fn cancel(&mut self) {
        if !self.summary.cancelled {
            info!(remaining = self.queue.len(), "Batch download cancelled");
            self.summary.cancelled = true;
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::MockSource;
    use crate::source::Source;
    use crate::state::gallery::Gallery;
    use tokio::time::Instant;

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    /// The same loop the app runs through its message queue
    async fn drive(
        gallery: &mut Gallery,
        batch: &mut BatchDownload,
        source: &Source,
        starts: &mut Vec<(ItemId, Instant)>,
        events: &mut Vec<BatchEvent>,
    ) -> BatchSummary {
        loop {
            match batch.next(|id| gallery.item(id).cloned()) {
                Step::Download(item) => {
                    starts.push((item.id.clone(), Instant::now()));
                    let result = source.download(&item).await.map(|_| ());
                    let Recorded::Counted(event) = batch.record(&item.id, result) else {
                        panic!("result for {} was treated as stale", item.id);
                    };
                    events.extend(event);
                    if let Some(pause) = batch.pause() {
                        tokio::time::sleep(pause).await;
                    }
                }
                Step::Finished(summary) => {
                    if !summary.cancelled {
                        gallery.deselect_all();
                    }
                    return summary;
                }
            }
        }
    }

    async fn loaded_gallery(source: &Source) -> Gallery {
        let mut gallery = Gallery::new(12);
        let request = gallery.begin_initial().unwrap();
        let page = source.list_images(request.page, request.limit).await;
        gallery.finish_page(request, page).unwrap();
        gallery
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_items_paced_in_order() {
        let mock = MockSource::new(20, Duration::ZERO);
        let source = Source::Mock(mock.clone());
        let mut gallery = loaded_gallery(&source).await;
        for s in ["5", "2", "9"] {
            gallery.toggle_selection(&id(s));
        }

        let (mut batch, started) = BatchDownload::start(gallery.selected_ids().to_vec(), DEFAULT_PACING);
        assert_eq!(started, BatchEvent::Started { total: 3 });

        let mut starts = Vec::new();
        let mut events = Vec::new();
        let summary = drive(&mut gallery, &mut batch, &source, &mut starts, &mut events).await;

        let order: Vec<_> = starts.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, ["5", "2", "9"]);
        assert_eq!(mock.downloaded(), vec![id("5"), id("2"), id("9")]);
        assert!(starts[2].1 - starts[0].1 >= Duration::from_millis(1000));
        assert_eq!(summary.downloaded, 3);
        assert!(events.is_empty());
        assert!(!gallery.is_selection_mode());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort_batch() {
        let mock = MockSource::new(5, Duration::ZERO);
        mock.fail_downloads_of(&id("2"));
        let source = Source::Mock(mock.clone());
        let mut gallery = loaded_gallery(&source).await;
        for s in ["1", "2", "3"] {
            gallery.toggle_selection(&id(s));
        }

        let (mut batch, _) = BatchDownload::start(gallery.selected_ids().to_vec(), DEFAULT_PACING);
        let mut starts = Vec::new();
        let mut events = Vec::new();
        let summary = drive(&mut gallery, &mut batch, &source, &mut starts, &mut events).await;

        assert_eq!(starts.len(), 3);
        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.failed, 1);
        assert!(matches!(&events[..], [BatchEvent::ItemFailed { id, .. }] if id.as_str() == "2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_item_is_skipped() {
        let source = Source::Mock(MockSource::new(5, Duration::ZERO));
        let mut gallery = loaded_gallery(&source).await;
        for s in ["1", "2", "3"] {
            gallery.toggle_selection(&id(s));
        }

        let (mut batch, _) = BatchDownload::start(gallery.selected_ids().to_vec(), DEFAULT_PACING);
        gallery.remove(&id("3"));

        let mut starts = Vec::new();
        let mut events = Vec::new();
        let summary = drive(&mut gallery, &mut batch, &source, &mut starts, &mut events).await;

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_cancel_stops_between_items() {
        let items: Vec<Item> = ["a", "b", "c"]
            .iter()
            .map(|s| Item::new(*s, format!("mock://{s}")))
            .collect();
        let resolve = |id: &ItemId| items.iter().find(|i| &i.id == id).cloned();

        let (mut batch, _) = BatchDownload::start(vec![id("a"), id("b"), id("c")], DEFAULT_PACING);
        let Step::Download(first) = batch.next(resolve) else {
            panic!("expected a download step");
        };
        batch.cancel();
        assert_eq!(batch.record(&first.id, Ok(())), Recorded::Counted(None));
        assert_eq!(batch.pause(), None);

        let Step::Finished(summary) = batch.next(resolve) else {
            panic!("expected the batch to finish");
        };
        assert!(summary.cancelled);
        assert_eq!(summary.downloaded, 1);
        assert_eq!(batch.remaining(), 2);
    }

    #[test]
    fn test_no_pause_after_last_item() {
        let item = Item::new("a", "mock://a");
        let (mut batch, _) = BatchDownload::start(vec![id("a")], DEFAULT_PACING);

        assert_eq!(batch.next(|_| Some(item.clone())), Step::Download(item.clone()));
        assert_eq!(batch.record(&item.id, Ok(())), Recorded::Counted(None));
        assert_eq!(batch.pause(), None);
        assert!(matches!(batch.next(|_| None), Step::Finished(_)));
    }

    #[test]
    fn test_stale_result_does_not_advance() {
        let items: Vec<Item> = ["a", "b"]
            .iter()
            .map(|s| Item::new(*s, format!("mock://{s}")))
            .collect();
        let resolve = |id: &ItemId| items.iter().find(|i| &i.id == id).cloned();

        let (mut batch, _) = BatchDownload::start(vec![id("a"), id("b")], DEFAULT_PACING);
        let Step::Download(first) = batch.next(resolve) else {
            panic!("expected a download step");
        };

        // A reply left over from an earlier batch
        assert_eq!(batch.record(&id("old"), Ok(())), Recorded::Stale);
        assert_eq!(batch.remaining(), 1);
        assert_eq!(batch.summary().downloaded, 0);

        // The real result is still accepted afterwards
        assert_eq!(batch.record(&first.id, Ok(())), Recorded::Counted(None));
        assert_eq!(batch.summary().downloaded, 1);
        assert_eq!(batch.next(resolve), Step::Download(items[1].clone()));
    }
}
