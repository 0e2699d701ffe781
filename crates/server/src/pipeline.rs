#![forbid(unsafe_code)]

//! Upload and verification of student documents.

use crate::blob::{BlobError, FileRef, StoredFile};
use crate::state::AppContext;
use it_core::{
    DocumentFlag, IdError, UNKNOWN_DOCUMENT, Username, classify, contains_all_keywords,
    file_extension, known_label, stored_file_name,
};
use it_storage::StoreError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("User folder not found")]
    MissingFolder,
    #[error("invalid username: {0}")]
    Username(#[from] IdError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("blocking task: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct UploadOptions {
    pub company: Option<String>,
    /// Used when classification finds nothing.
    pub declared_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedDocument {
    pub file_id: String,
    pub name: String,
    pub original_name: String,
    pub doc_type: &'static str,
    pub size: u64,
    pub sha256: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub file_id: String,
    pub doc_type: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub username: String,
    #[serde(default)]
    pub company_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub verified: bool,
    pub record_id: String,
    pub column: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renamed: Option<StoredFile>,
}

/// Temporary copy of an upload on local disk, removed on drop whatever
/// happens to the request.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    pub async fn write(dir: &Path, extension: &str, bytes: &[u8]) -> Result<Self, std::io::Error> {
        let upload = Self {
            path: dir.join(format!("{}{extension}", uuid::Uuid::new_v4().simple())),
        };
        tokio::fs::write(&upload.path, bytes).await?;
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Classifies and stores each file in the user's folder. Files stored before
/// a failing one stay stored.
pub async fn upload_documents(
    ctx: &AppContext,
    username: &Username,
    options: &UploadOptions,
    files: Vec<IncomingFile>,
) -> Result<Vec<UploadedDocument>, PipelineError> {
    if files.is_empty() {
        return Err(PipelineError::InvalidInput("No files uploaded"));
    }
    let folder = folder_of(ctx, username).await?;
    let upload_dir = ctx.config.upload_dir();
    let company = options
        .company
        .as_deref()
        .map(str::trim)
        .filter(|company| !company.is_empty());

    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        let temp =
            TempUpload::write(&upload_dir, file_extension(&file.file_name), &file.bytes).await?;
        let text = extract_text(ctx, temp.path()).await;
        let doc_type = resolve_label(&text, options.declared_type.as_deref());
        let name = stored_file_name(username, company, doc_type, &file.file_name);
        let sha256 = hex::encode(Sha256::digest(&file.bytes));
        let content_type = file
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream")
            .to_string();

        let stored = ctx
            .blobs
            .put(&folder, &name, &content_type, file.bytes)
            .await?;
        drop(temp);
        info!(
            username = %username,
            file_id = %stored.file_id,
            doc_type,
            "document uploaded"
        );
        uploaded.push(UploadedDocument {
            file_id: stored.file_id,
            name: stored.name,
            original_name: file.file_name,
            doc_type,
            size: stored.size,
            sha256,
        });
    }
    Ok(uploaded)
}

/// Checks a stored document against the required keywords and records the
/// outcome in the matching record's flag column.
pub async fn verify_document(
    ctx: &AppContext,
    request: VerifyRequest,
) -> Result<VerifyOutcome, PipelineError> {
    let keywords = request
        .keywords
        .iter()
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<_>>();
    if keywords.is_empty() {
        return Err(PipelineError::InvalidInput("keywords must not be empty"));
    }
    let flag = DocumentFlag::from_doc_type(&request.doc_type).ok_or(
        PipelineError::InvalidInput("document type has no verification column"),
    )?;
    let username = Username::try_new(request.username.as_str())?;
    let company = request.company_name.trim().to_string();
    if company.is_empty() {
        return Err(PipelineError::InvalidInput("companyName is required"));
    }
    let file_ref = FileRef::parse(&request.file_id)?;

    let bytes = ctx.blobs.get(&request.file_id).await?;
    let temp = TempUpload::write(
        &ctx.config.upload_dir(),
        file_extension(file_ref.name),
        &bytes,
    )
    .await?;
    let text = extract_text(ctx, temp.path()).await;
    drop(temp);
    let verified = contains_all_keywords(&text, &keywords);

    let records = Arc::clone(&ctx.records);
    let register_no = username.as_str().to_string();
    let flag_company = company.clone();
    let update = tokio::task::spawn_blocking(move || {
        records.set_flag(&register_no, &flag_company, flag, verified.into())
    })
    .await??;

    let renamed = if !verified && ctx.config.rename_unverified {
        let new_name = stored_file_name(&username, Some(&company), UNKNOWN_DOCUMENT, file_ref.name);
        Some(ctx.blobs.rename(&request.file_id, &new_name).await?)
    } else {
        None
    };

    info!(
        username = %username,
        file_id = %request.file_id,
        column = flag.column(),
        verified,
        "document verified"
    );
    Ok(VerifyOutcome {
        verified,
        record_id: update.record_id,
        column: flag.column(),
        renamed,
    })
}

/// Classification falls back to the caller's declared type only when the
/// text matches nothing.
pub fn resolve_label(text: &str, declared_type: Option<&str>) -> &'static str {
    let classified = classify(text);
    if classified != UNKNOWN_DOCUMENT {
        return classified;
    }
    declared_type
        .and_then(known_label)
        .unwrap_or(UNKNOWN_DOCUMENT)
}

async fn folder_of(ctx: &AppContext, username: &Username) -> Result<String, PipelineError> {
    let accounts = Arc::clone(&ctx.accounts);
    let lookup = username.clone();
    let account = tokio::task::spawn_blocking(move || {
        let accounts = accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        accounts.find_by_username(&lookup)
    })
    .await??;
    account
        .and_then(|account| account.folder_ref)
        .ok_or(PipelineError::MissingFolder)
}

/// Extraction failures degrade to empty text.
async fn extract_text(ctx: &AppContext, path: &Path) -> String {
    let extractor = Arc::clone(&ctx.extractor);
    let owned = path.to_path_buf();
    match tokio::task::spawn_blocking(move || extractor.extract(&owned)).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            warn!(path = %path.display(), error = %err, "text extraction failed");
            String::new()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "text extraction task failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_type_only_fills_in_for_unknown_documents() {
        assert_eq!(
            resolve_label("This Offer Letter confirms", Some("Internship Report")),
            "Offer Letter"
        );
        assert_eq!(
            resolve_label("scanned image", Some("internship report")),
            "Internship Report"
        );
        assert_eq!(resolve_label("scanned image", Some("Bank Statement")), UNKNOWN_DOCUMENT);
        assert_eq!(resolve_label("", None), UNKNOWN_DOCUMENT);
    }

    #[tokio::test]
    async fn temp_upload_is_removed_on_drop() {
        let dir = std::env::temp_dir();
        let upload = TempUpload::write(&dir, ".txt", b"hello").await.expect("write");
        let path = upload.path().to_path_buf();
        assert!(path.exists());
        assert!(path.to_string_lossy().ends_with(".txt"));
        drop(upload);
        assert!(!path.exists());
    }
}
