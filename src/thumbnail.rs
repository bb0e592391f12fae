use image::imageops::FilterType;

use crate::error::{GalleryError, Result};

/// Size of generated thumbnails (longest edge)
pub const THUMBNAIL_SIZE: u32 = 256;

/// Decoded thumbnail ready to hand to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, row-major
    pub pixels: Vec<u8>,
}

/// Decode fetched image bytes and shrink them to thumbnail size.
///
/// Runs on the blocking pool since decoding large photos is CPU-bound.
pub async fn generate_thumbnail(bytes: Vec<u8>) -> Result<Thumbnail> {
    tokio::task::spawn_blocking(move || generate_thumbnail_blocking(&bytes))
        .await
        .map_err(|e| GalleryError::Decode(format!("Task join error: {}", e)))?
}

/// Blocking version of thumbnail generation
pub fn generate_thumbnail_blocking(bytes: &[u8]) -> Result<Thumbnail> {
    let img = image::load_from_memory(bytes)?;

    // Small images are kept as they are
    let thumbnail = if img.width() > THUMBNAIL_SIZE || img.height() > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    let rgba = thumbnail.into_rgba8();
    Ok(Thumbnail {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}
