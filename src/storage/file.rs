//! File-backed key-value backend.
//!
//! Each item is stored as its own file inside one directory:
//! ```text
//! {directory}/{hex(key)}.json
//! ```
//!
//! Hex-encoding keeps arbitrary keys safe as file names on every platform
//! and lets `all_keys` recover the original key. Writes go to a temporary
//! file unique to that write and are renamed into place, so overlapping
//! writes of one key never share a temp file and the last rename wins.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cache::KeyValueStore;
use crate::error::Result;

const ITEM_EXTENSION: &str = ".json";
const TEMP_EXTENSION: &str = ".tmp";

/// Per-process write counter used to name temp files.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Durable [`KeyValueStore`] rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    directory: PathBuf,
}

impl FileKeyValueStore {
    /// Opens the store, creating `directory` if it does not exist.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;

        info!(dir = %directory.display(), "File key-value store opened");
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}", encode_key(key), ITEM_EXTENSION))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!(
            "{}{}.{}-{}{}",
            encode_key(key),
            ITEM_EXTENSION,
            std::process::id(),
            seq,
            TEMP_EXTENSION
        ))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        let temp = self.temp_path_for(key);

        let written = match tokio::fs::write(&temp, value.as_bytes()).await {
            Ok(()) => tokio::fs::rename(&temp, &path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn all_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.directory).await?;

        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(stem) = name.strip_suffix(ITEM_EXTENSION) else {
                continue;
            };
            match decode_key(stem) {
                Some(key) => keys.push(key),
                None => debug!(file = name, "Skipping foreign file in store directory"),
            }
        }

        Ok(keys)
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove_item(key).await?;
        }
        Ok(())
    }
}

fn encode_key(key: &str) -> String {
    key.bytes().map(|b| format!("{b:02x}")).collect()
}

fn decode_key(encoded: &str) -> Option<String> {
    if encoded.len() % 2 != 0 {
        return None;
    }

    let bytes = (0..encoded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(encoded.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;

    String::from_utf8(bytes).ok()
}
