//! Disk Blob Store Module
//!
//! Stores each object as a body file plus a JSON metadata sidecar, both
//! named by the SHA-256 of the key. Writes go through a temp file and a
//! rename; the sidecar is written last and removed first, so its presence
//! marks a complete entry.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;

use crate::cache::entry::{MediaResponse, ResponseMetadata};
use crate::cache::store::{BlobStore, StoreResult};

const BODY_EXTENSION: &str = "body";
const META_EXTENSION: &str = "json";

// == Disk Blob Store ==
/// Blob store rooted at one directory.
#[derive(Debug)]
pub struct DiskBlobStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl DiskBlobStore {
    // == Constructor ==
    /// Opens (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_stem(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::file_stem(key), BODY_EXTENSION))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::file_stem(key), META_EXTENSION))
    }

    fn tmp_path(&self, target: &Path) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let mut name = target.as_os_str().to_owned();
        name.push(format!(".{}.{}.tmp", std::process::id(), n));
        PathBuf::from(name)
    }

    async fn write_atomic(&self, target: &Path, contents: &[u8]) -> StoreResult<()> {
        let tmp = self.tmp_path(target);
        if let Err(err) = fs::write(&tmp, contents).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        if let Err(err) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn lookup(&self, key: &str) -> StoreResult<Option<MediaResponse>> {
        let raw_meta = match fs::read(self.meta_path(key)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let metadata: ResponseMetadata = serde_json::from_slice(&raw_meta)?;

        let body = match fs::read(self.body_path(key)).await {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(key, "metadata present without body, treating as miss");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Some(MediaResponse::from_parts(metadata, body)))
    }

    async fn put(&self, key: &str, response: &MediaResponse) -> StoreResult<()> {
        let metadata = serde_json::to_vec(&response.metadata())?;
        self.write_atomic(&self.body_path(key), &response.body)
            .await?;
        self.write_atomic(&self.meta_path(key), &metadata).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        for path in [self.meta_path(key), self.body_path(key)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
