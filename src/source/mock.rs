/// In-memory demo collection
///
/// Slices a fixed list of generated items per page and answers after a
/// simulated network delay. Image bytes are small generated PNGs so the
/// demo works offline. Clones share state, which lets tests inspect calls
/// made through a `Source`.
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use tracing::debug;

use super::page_bounds;
use crate::error::{GalleryError, Result};
use crate::state::data::{Item, ItemId, Page};

/// Size of generated demo images
const MOCK_WIDTH: u32 = 600;
const MOCK_HEIGHT: u32 = 400;

/// URL scheme used for generated images
const MOCK_SCHEME: &str = "mock://";

#[derive(Debug, Default)]
struct MockState {
    items: Vec<Item>,
    failing_deletes: HashSet<ItemId>,
    failing_downloads: HashSet<ItemId>,
    fail_next_list: bool,
    downloaded: Vec<ItemId>,
}

#[derive(Debug, Clone)]
pub struct MockSource {
    state: Arc<Mutex<MockState>>,
    list_calls: Arc<AtomicUsize>,
    latency: Duration,
}

impl MockSource {
    /// Collection of `total` items with ids "1", "2", ...
    pub fn new(total: usize, latency: Duration) -> Self {
        let items = (1..=total)
            .map(|n| Item {
                id: ItemId::new(n.to_string()),
                image_url: format!("{MOCK_SCHEME}{n}"),
                description: Some(format!("Sample image {n}")),
            })
            .collect();

        Self {
            state: Arc::new(Mutex::new(MockState {
                items,
                ..MockState::default()
            })),
            list_calls: Arc::new(AtomicUsize::new(0)),
            latency,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panic while holding the lock leaves plain data behind; keep going
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn simulate_latency(&self, latency: Duration) {
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    pub async fn list_images(&self, page: u32, limit: u32) -> Result<Page> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency(self.latency).await;

        let mut state = self.state();
        if state.fail_next_list {
            state.fail_next_list = false;
            return Err(GalleryError::Network("simulated outage".to_string()));
        }

        let (start, end, has_more) = page_bounds(page, limit, state.items.len());
        debug!(page, limit, start, end, "Mock page served");

        Ok(Page {
            images: state.items[start..end].to_vec(),
            has_more,
        })
    }

    pub async fn delete_image(&self, id: &ItemId) -> Result<()> {
        self.simulate_latency(self.latency * 3 / 5).await;

        let mut state = self.state();
        if state.failing_deletes.contains(id) {
            return Err(GalleryError::Network(format!("delete of {id} rejected")));
        }

        let before = state.items.len();
        state.items.retain(|item| &item.id != id);
        if state.items.len() == before {
            return Err(GalleryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        let id = url
            .strip_prefix(MOCK_SCHEME)
            .ok_or_else(|| GalleryError::NotFound(url.to_string()))?;
        render_placeholder(id)
    }

    pub async fn download(&self, item: &Item) -> Result<Vec<u8>> {
        {
            let mut state = self.state();
            state.downloaded.push(item.id.clone());
            if state.failing_downloads.contains(&item.id) {
                return Err(GalleryError::Network(format!("download of {} failed", item.id)));
            }
        }
        self.fetch_binary(&item.image_url).await
    }

    pub fn total(&self) -> usize {
        self.state().items.len()
    }
}

#[cfg(test)]
impl MockSource {
    /// Number of `list_images` calls so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Ids passed to `download`, in call order
    pub fn downloaded(&self) -> Vec<ItemId> {
        self.state().downloaded.clone()
    }

    pub fn fail_next_list(&self) {
        self.state().fail_next_list = true;
    }

    pub fn fail_deletes_of(&self, id: &ItemId) {
        self.state().failing_deletes.insert(id.clone());
    }

    pub fn fail_downloads_of(&self, id: &ItemId) {
        self.state().failing_downloads.insert(id.clone());
    }
}

/// Solid-colour PNG whose colour is derived from the id
fn render_placeholder(id: &str) -> Result<Vec<u8>> {
    let seed = id
        .bytes()
        .fold(0x811c_9dc5_u32, |hash, b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let [r, g, b, _] = seed.to_le_bytes();
    let img = RgbImage::from_pixel(MOCK_WIDTH, MOCK_HEIGHT, Rgb([r, g, b]));

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
