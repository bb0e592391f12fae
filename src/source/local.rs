/// Local folder source
///
/// Serves the regular files of one directory, sorted by lower-cased
/// name so pages stay stable. The file name is the id; deleting an item
/// removes the file.
use std::path::{Path, PathBuf};

use tokio::task;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::page_bounds;
use crate::error::{GalleryError, Result};
use crate::state::data::{Item, ItemId, Page};

/// Extensions recognised as images
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

#[derive(Debug, Clone)]
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn list_images(&self, page: u32, limit: u32) -> Result<Page> {
        let dir = self.dir.clone();

        // Directory walks block, keep them off the async workers
        let files = task::spawn_blocking(move || list_image_files(&dir))
            .await
            .map_err(|e| GalleryError::Io(format!("Task join error: {}", e)))??;

        let (start, end, has_more) = page_bounds(page, limit, files.len());
        let images = files[start..end]
            .iter()
            .map(|path| Item::new(file_name(path), path.to_string_lossy()))
            .collect();

        Ok(Page { images, has_more })
    }

    pub async fn delete_image(&self, id: &ItemId) -> Result<()> {
        let path = self.file_path(id)?;
        tokio::fs::remove_file(&path).await?;
        info!("Deleted {}", path.display());
        Ok(())
    }

    pub async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(url).await?)
    }

    /// Path of the file behind `id`, refusing anything outside the folder
    fn file_path(&self, id: &ItemId) -> Result<PathBuf> {
        let name = id.as_str();
        let is_plain_name = !name.is_empty()
            && Path::new(name).file_name().is_some_and(|f| f == name);

        if !is_plain_name {
            return Err(GalleryError::NotFound(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Image files directly inside `dir`, sorted case-insensitively
fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GalleryError::NotFound(format!(
            "image folder {} does not exist",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_image(path))
        .collect();

    files.sort_by_key(|path| file_name(path).to_lowercase());
    debug!(count = files.len(), "Scanned {}", dir.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn folder(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_pages_sorted_case_insensitively() {
        let dir = folder(&["b.jpg", "A.png", "c.JPG", "notes.txt"]);
        fs::create_dir(dir.path().join("sub.jpg")).unwrap();
        let source = LocalSource::new(dir.path().to_path_buf());

        let first = source.list_images(1, 2).await.unwrap();
        let ids: Vec<_> = first.images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["A.png", "b.jpg"]);
        assert!(first.has_more);

        let second = source.list_images(2, 2).await.unwrap();
        let ids: Vec<_> = second.images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["c.JPG"]);
        assert!(!second.has_more);

        let bytes = source.fetch_binary(&second.images[0].image_url).await.unwrap();
        assert_eq!(bytes, b"c.JPG");
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let dir = folder(&["a.jpg", "b.jpg"]);
        let source = LocalSource::new(dir.path().to_path_buf());

        source.delete_image(&ItemId::from("a.jpg")).await.unwrap();

        assert!(!dir.path().join("a.jpg").exists());
        assert!(matches!(
            source.delete_image(&ItemId::from("a.jpg")).await,
            Err(GalleryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_rejects_paths_outside_folder() {
        let dir = folder(&["a.jpg"]);
        let source = LocalSource::new(dir.path().join("inner"));

        let result = source.delete_image(&ItemId::from("../a.jpg")).await;

        assert!(matches!(result, Err(GalleryError::NotFound(_))));
        assert!(dir.path().join("a.jpg").exists());
    }

    #[tokio::test]
    async fn test_missing_folder() {
        let source = LocalSource::new(PathBuf::from("/definitely/not/here"));
        assert!(source.list_images(1, 10).await.is_err());
    }
}
