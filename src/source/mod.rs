/// Image sources
///
/// This module handles:
/// - Paging through an image collection
/// - Deleting images
/// - Fetching image bytes for thumbnails, the viewer and downloads
///
/// Backends are an in-memory mock, a REST server and a local folder.
/// `Source` is cheap to clone so it can be moved into background tasks.
pub mod local;
pub mod mock;
pub mod rest;

use crate::config::{SourceConfig, DEMO_LATENCY_MS, DEMO_TOTAL};
use crate::error::Result;
use crate::state::data::{Item, ItemId, Page};

#[derive(Debug, Clone)]
pub enum Source {
    Mock(mock::MockSource),
    Rest(rest::RestSource),
    Local(local::LocalSource),
}

impl Source {
    /// Build the source described by the configuration
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let source = match config {
            SourceConfig::Mock { total, latency_ms } => Self::Mock(mock::MockSource::new(
                *total,
                std::time::Duration::from_millis(*latency_ms),
            )),
            SourceConfig::Rest { base_url } => Self::Rest(rest::RestSource::new(base_url)?),
            SourceConfig::Local { dir } => Self::Local(local::LocalSource::new(dir.clone())),
        };
        Ok(source)
    }

    /// The generated demo collection with default settings
    pub fn demo() -> Self {
        Self::Mock(mock::MockSource::new(
            DEMO_TOTAL,
            std::time::Duration::from_millis(DEMO_LATENCY_MS),
        ))
    }

    /// Attach the session token to outgoing requests (REST only)
    pub fn with_token(self, token: Option<String>) -> Self {
        match self {
            Self::Rest(rest) => Self::Rest(rest.with_token(token)),
            other => other,
        }
    }

    /// `page` is 1-based
    pub async fn list_images(&self, page: u32, limit: u32) -> Result<Page> {
        match self {
            Self::Mock(source) => source.list_images(page, limit).await,
            Self::Rest(source) => source.list_images(page, limit).await,
            Self::Local(source) => source.list_images(page, limit).await,
        }
    }

    pub async fn delete_image(&self, id: &ItemId) -> Result<()> {
        match self {
            Self::Mock(source) => source.delete_image(id).await,
            Self::Rest(source) => source.delete_image(id).await,
            Self::Local(source) => source.delete_image(id).await,
        }
    }

    /// Raw bytes behind an item's `image_url`
    pub async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        match self {
            Self::Mock(source) => source.fetch_binary(url).await,
            Self::Rest(source) => source.fetch_binary(url).await,
            Self::Local(source) => source.fetch_binary(url).await,
        }
    }

    /// Original bytes of an item, for saving to disk
    pub async fn download(&self, item: &Item) -> Result<Vec<u8>> {
        match self {
            Self::Mock(source) => source.download(item).await,
            Self::Rest(source) => source.download(&item.id).await,
            Self::Local(source) => source.fetch_binary(&item.image_url).await,
        }
    }

    /// Human readable description for the header
    pub fn label(&self) -> String {
        match self {
            Self::Mock(source) => format!("Demo collection ({} images)", source.total()),
            Self::Rest(source) => source.base_url().to_string(),
            Self::Local(source) => source.dir().display().to_string(),
        }
    }
}

/// Slice bounds of a 1-based page over `total` entries, plus whether more follow
pub(crate) fn page_bounds(page: u32, limit: u32, total: usize) -> (usize, usize, bool) {
    let page = page.max(1) as usize;
    let limit = limit.max(1) as usize;
    let start = ((page - 1) * limit).min(total);
    let end = (page * limit).min(total);
    (start, end, page * limit < total)
}
