#![forbid(unsafe_code)]

use super::{BlobError, StoredFile};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Filesystem-backed storage rooted at one directory; file references map
/// directly onto relative paths.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, BlobError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(super) async fn create_folder(&self, folder: &str) -> Result<(), BlobError> {
        tokio::fs::create_dir_all(self.root.join(folder)).await?;
        Ok(())
    }

    pub(super) async fn put(&self, file_id: &str, bytes: Vec<u8>) -> Result<(), BlobError> {
        let path = self.root.join(file_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    pub(super) async fn get(&self, file_id: &str) -> Result<Vec<u8>, BlobError> {
        tokio::fs::read(self.root.join(file_id))
            .await
            .map_err(not_found_or_io)
    }

    pub(super) async fn rename(&self, from: &str, to: &str) -> Result<u64, BlobError> {
        let target = self.root.join(to);
        tokio::fs::rename(self.root.join(from), &target)
            .await
            .map_err(not_found_or_io)?;
        Ok(tokio::fs::metadata(target).await?.len())
    }

    pub(super) async fn list(&self, folder: &str) -> Result<Vec<StoredFile>, BlobError> {
        let mut objects = match tokio::fs::read_dir(self.root.join(folder)).await {
            Ok(objects) => objects,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut files = Vec::new();
        while let Some(object) = objects.next_entry().await? {
            if !object.file_type().await?.is_dir() {
                continue;
            }
            let object_id = object.file_name().to_string_lossy().into_owned();
            let mut entries = tokio::fs::read_dir(object.path()).await?;
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if !metadata.is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let modified_at = metadata
                    .modified()
                    .ok()
                    .map(OffsetDateTime::from)
                    .and_then(|ts| ts.format(&Rfc3339).ok());
                files.push(StoredFile {
                    file_id: format!("{folder}/{object_id}/{name}"),
                    name,
                    size: metadata.len(),
                    modified_at,
                });
            }
        }
        Ok(files)
    }
}

fn not_found_or_io(err: std::io::Error) -> BlobError {
    if err.kind() == ErrorKind::NotFound {
        BlobError::NotFound
    } else {
        BlobError::Io(err)
    }
}
