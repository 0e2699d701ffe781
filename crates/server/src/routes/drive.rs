#![forbid(unsafe_code)]

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppContext;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

/// Shared folder holding snapshots of the record file.
pub const RECORDS_FOLDER: &str = "records";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderBody {
    pub folder_name: String,
}

pub async fn create_folder(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    body: Result<Json<CreateFolderBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    user.require_teacher()?;
    let Json(body) = body?;
    if body.folder_name.trim().is_empty() {
        return Err(ApiError::bad_request("folderName is required"));
    }
    let folder_id = ctx.blobs.create_folder(&body.folder_name).await?;
    info!(folder_id = %folder_id, by = user.username(), "folder created");
    Ok(Json(json!({
        "success": true,
        "folderId": folder_id,
        "message": "Folder created successfully",
    })))
}

/// Uploads a snapshot of the current record file.
pub async fn upload_records(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    user.require_teacher()?;
    let path = ctx.records.path().to_path_buf();
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Record file not found".to_string()));
        }
        Err(err) => return Err(it_storage::StoreError::Io(err).into()),
    };
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "student_data.csv".to_string());

    let stored = ctx
        .blobs
        .put(RECORDS_FOLDER, &name, "text/csv", bytes)
        .await?;
    info!(file_id = %stored.file_id, by = user.username(), "record file uploaded");
    Ok(Json(json!({
        "success": true,
        "fileId": stored.file_id,
        "message": "File uploaded successfully",
    })))
}
