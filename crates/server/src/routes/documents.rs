#![forbid(unsafe_code)]

use crate::auth::CurrentUser;
use crate::blob::FileRef;
use crate::error::ApiError;
use crate::pipeline::{self, IncomingFile, UploadOptions, VerifyRequest};
use crate::state::AppContext;
use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Query, State};
use it_core::Username;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub username: Option<String>,
}

/// Multipart upload: file parts (conventionally named `files`) plus optional
/// `companyName`, `docType` (or `documentType`) and `username` (or
/// `studentId`) text fields.
pub async fn upload(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart?;
    let mut files = Vec::new();
    let mut options = UploadOptions::default();
    let mut target: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await?;
            files.push(IncomingFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }
        let value = field.text().await?;
        match field_name.as_str() {
            "companyName" | "company" => options.company = Some(value),
            "docType" | "documentType" => options.declared_type = Some(value),
            "username" | "studentId" => target = Some(value),
            _ => {}
        }
    }

    let username = match target.filter(|name| !name.trim().is_empty()) {
        Some(name) => {
            user.require_access_to(&name)?;
            Username::try_new(name)?
        }
        None => user.account.username.clone(),
    };

    let uploaded = pipeline::upload_documents(&ctx, &username, &options, files).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Files uploaded successfully",
        "uploadedFiles": uploaded,
    })))
}

pub async fn list(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let folder = match query.username.filter(|name| !name.trim().is_empty()) {
        Some(name) if name.trim() != user.username() => {
            user.require_teacher()?;
            let username = Username::try_new(name)?;
            ctx.with_accounts(move |accounts| accounts.find_by_username(&username))
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
                .folder_ref
        }
        _ => user.account.folder_ref.clone(),
    };
    let folder = folder.ok_or_else(|| ApiError::bad_request("User folder not found"))?;

    let files = ctx.blobs.list(&folder).await?;
    Ok(Json(json!({
        "success": true,
        "count": files.len(),
        "files": files,
    })))
}

pub async fn verify(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    user.require_access_to(&request.username)?;
    if !user.is_teacher() {
        let file_ref = FileRef::parse(&request.file_id)?;
        if user.account.folder_ref.as_deref() != Some(file_ref.folder) {
            return Err(ApiError::Forbidden);
        }
    }

    let outcome = pipeline::verify_document(&ctx, request).await?;
    let message = if outcome.verified {
        "Document verified"
    } else {
        "Document verification failed"
    };
    Ok(Json(json!({
        "success": true,
        "verified": outcome.verified,
        "message": message,
        "recordId": outcome.record_id,
        "column": outcome.column,
        "renamed": outcome.renamed,
    })))
}
