/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the image sources and the UI layer.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension for downloads whose format cannot be recognised
const FALLBACK_EXTENSION: &str = "jpg";

/// Stable identifier of an image, as assigned by the source
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Represents a single image in the gallery
///
/// Immutable once loaded; two items are the same image when their ids match.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique, stable id (the file name for folder-backed sources)
    pub id: ItemId,
    /// Where the full image can be fetched from
    pub image_url: String,
    /// Optional caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            image_url: image_url.into(),
            description: None,
        }
    }

    /// File name used when the image is saved locally.
    ///
    /// Ids that already look like file names are kept as-is. Otherwise the
    /// extension comes from the format sniffed from `bytes`.
    pub fn download_filename(&self, bytes: &[u8]) -> String {
        let id = self.id.as_str();
        let has_extension = std::path::Path::new(id)
            .extension()
            .is_some_and(|ext| !ext.is_empty());

        if has_extension {
            id.to_string()
        } else {
            let ext = image::guess_format(bytes)
                .ok()
                .and_then(|format| format.extensions_str().first().copied())
                .unwrap_or(FALLBACK_EXTENSION);
            format!("image-{}.{}", id, ext)
        }
    }
}

/// One page of results as returned by `GET /images`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub images: Vec<Item>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}
