/// Saving downloaded images to disk
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::Result;
use crate::source::Source;
use crate::state::data::Item;

/// Give up looking for a free name after this many attempts
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Fetch an item from its source and save it into `dir`
pub async fn download_item(source: Source, item: Item, dir: PathBuf) -> Result<PathBuf> {
    let bytes = source.download(&item).await?;
    save_download(&dir, &item.download_filename(&bytes), &bytes).await
}

/// Write `bytes` as `dir/filename`, never replacing an existing file.
///
/// Taken names get a counter: `photo.jpg`, `photo (1).jpg`, `photo (2).jpg`...
pub async fn save_download(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;

    let mut attempt = 0;
    loop {
        let path = dir.join(numbered_name(filename, attempt));
        let opened = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;

        match opened {
            Ok(mut file) => {
                file.write_all(bytes).await?;
                file.flush().await?;
                info!("Saved download to {}", path.display());
                return Ok(path);
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// `name.ext` for attempt 0, `name (n).ext` afterwards
fn numbered_name(filename: &str, attempt: u32) -> String {
    if attempt == 0 {
        return filename.to_string();
    }

    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{filename} ({attempt})"),
    }
}
