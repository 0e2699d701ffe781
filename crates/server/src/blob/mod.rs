#![forbid(unsafe_code)]

//! Document storage. A file reference is `{folder}/{object-id}/{name}`:
//! every upload gets a fresh object id, so uploads never overwrite each
//! other even when the stored names collide.

mod local;
mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("file not found")]
    NotFound,
    #[error("invalid file reference: {0}")]
    InvalidRef(String),
    #[error("object storage: {0}")]
    S3(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

#[derive(Clone, Debug)]
pub enum BlobStore {
    Local(LocalBlobStore),
    S3(S3BlobStore),
}

impl BlobStore {
    /// Creates a new folder and returns its reference. Folder references are
    /// the sanitized name plus a short unique suffix.
    pub async fn create_folder(&self, name: &str) -> Result<String, BlobError> {
        let folder = new_folder_ref(name);
        match self {
            BlobStore::Local(store) => store.create_folder(&folder).await?,
            BlobStore::S3(store) => store.create_folder(&folder).await?,
        }
        Ok(folder)
    }

    /// Stores into an existing (or fixed, well-known) folder.
    pub async fn put(
        &self,
        folder: &str,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, BlobError> {
        check_segment(folder)?;
        let name = sanitize_segment(name);
        let file_id = format!("{folder}/{}/{name}", uuid::Uuid::new_v4().simple());
        let size = bytes.len() as u64;
        match self {
            BlobStore::Local(store) => store.put(&file_id, bytes).await?,
            BlobStore::S3(store) => store.put(&file_id, content_type, bytes).await?,
        }
        Ok(StoredFile {
            file_id,
            name,
            size,
            modified_at: None,
        })
    }

    pub async fn get(&self, file_id: &str) -> Result<Vec<u8>, BlobError> {
        FileRef::parse(file_id)?;
        match self {
            BlobStore::Local(store) => store.get(file_id).await,
            BlobStore::S3(store) => store.get(file_id).await,
        }
    }

    /// Renames the stored object, keeping its folder and object id.
    pub async fn rename(&self, file_id: &str, new_name: &str) -> Result<StoredFile, BlobError> {
        let file_ref = FileRef::parse(file_id)?;
        let name = sanitize_segment(new_name);
        let renamed = format!("{}/{}/{name}", file_ref.folder, file_ref.object_id);
        let size = match self {
            BlobStore::Local(store) => store.rename(file_id, &renamed).await?,
            BlobStore::S3(store) => store.rename(file_id, &renamed).await?,
        };
        Ok(StoredFile {
            file_id: renamed,
            name,
            size,
            modified_at: None,
        })
    }

    pub async fn list(&self, folder: &str) -> Result<Vec<StoredFile>, BlobError> {
        check_segment(folder)?;
        let mut files = match self {
            BlobStore::Local(store) => store.list(folder).await?,
            BlobStore::S3(store) => store.list(folder).await?,
        };
        files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.file_id.cmp(&b.file_id)));
        Ok(files)
    }
}

/// Parsed `{folder}/{object-id}/{name}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileRef<'a> {
    pub folder: &'a str,
    pub object_id: &'a str,
    pub name: &'a str,
}

impl<'a> FileRef<'a> {
    pub fn parse(file_id: &'a str) -> Result<Self, BlobError> {
        let invalid = || BlobError::InvalidRef(file_id.to_string());
        let mut parts = file_id.split('/');
        let (Some(folder), Some(object_id), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };
        for part in [folder, object_id, name] {
            check_segment(part).map_err(|_| invalid())?;
        }
        Ok(Self {
            folder,
            object_id,
            name,
        })
    }
}

fn check_segment(segment: &str) -> Result<(), BlobError> {
    let ok = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0']);
    if ok {
        Ok(())
    } else {
        Err(BlobError::InvalidRef(segment.to_string()))
    }
}

fn sanitize_segment(name: &str) -> String {
    let cleaned = name
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | '\0' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect::<String>();
    match cleaned.as_str() {
        "" | "." | ".." => "file".to_string(),
        _ => cleaned,
    }
}

fn new_folder_ref(name: &str) -> String {
    let base = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    let base = base.trim_matches('.');
    let base = if base.is_empty() { "folder" } else { base };
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{base}-{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_refs_have_three_clean_segments() {
        let parsed = FileRef::parse("s101-ab12cd34/0f0f/S101-Offer Letter.pdf").expect("ref");
        assert_eq!(parsed.folder, "s101-ab12cd34");
        assert_eq!(parsed.object_id, "0f0f");
        assert_eq!(parsed.name, "S101-Offer Letter.pdf");

        for bad in ["", "a/b", "a/b/c/d", "../b/c", "a//c", "a/b/.."] {
            assert!(FileRef::parse(bad).is_err(), "{bad:?} must be rejected");
        }
    }

    #[test]
    fn folder_refs_are_sanitized_and_unique() {
        let first = new_folder_ref("7376221CS101");
        let second = new_folder_ref("7376221CS101");
        assert!(first.starts_with("7376221CS101-"));
        assert_ne!(first, second);
        assert!(new_folder_ref("../etc").starts_with("_etc-"));
        assert!(new_folder_ref("  ").starts_with("folder-"));
    }

    #[test]
    fn stored_names_never_contain_separators() {
        assert_eq!(sanitize_segment("a/b\\c.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_segment(".."), "file");
    }
}
