#![forbid(unsafe_code)]

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppContext;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use it_core::InternshipRecord;
use serde_json::{Value, json};
use tracing::info;

/// Teachers get every record, students only their own.
pub async fn list_all(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let records = if user.is_teacher() {
        ctx.with_records(|records| records.list()).await?
    } else {
        let register_no = user.username().to_string();
        ctx.with_records(move |records| records.list_for(&register_no))
            .await?
    };
    Ok(Json(list_response(records)))
}

pub async fn list_student(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(register_no): Path<String>,
) -> Result<Json<Value>, ApiError> {
    user.require_access_to(&register_no)?;
    let records = ctx
        .with_records(move |records| records.list_for(&register_no))
        .await?;
    Ok(Json(list_response(records)))
}

pub async fn get_one(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let record = ctx
        .with_records(move |records| records.get(&record_id))
        .await?;
    user.require_access_to(&record.register_no)?;
    Ok(Json(json!({ "success": true, "record": record })))
}

pub async fn add(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    body: Result<Json<InternshipRecord>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(record) = body?;
    user.require_access_to(&record.register_no)?;
    let stored = ctx
        .with_records(move |records| records.append(record))
        .await?;
    info!(
        record_id = %stored.record_id,
        register_no = %stored.register_no,
        by = user.username(),
        "record added"
    );
    Ok(Json(json!({
        "success": true,
        "message": "Data saved successfully",
        "record": stored,
    })))
}

/// Positional update: `ordinal` counts the caller-visible records of the
/// register number named in the body.
pub async fn update_at(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    ordinal: Result<Path<usize>, PathRejection>,
    body: Result<Json<InternshipRecord>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(ordinal) = ordinal?;
    let Json(record) = body?;
    user.require_access_to(&record.register_no)?;
    let register_no = record.register_no.trim().to_string();
    let stored = ctx
        .with_records(move |records| records.update_at(&register_no, ordinal, record))
        .await?;
    info!(record_id = %stored.record_id, ordinal, "record updated");
    Ok(Json(json!({
        "success": true,
        "message": "Record updated successfully",
        "record": stored,
    })))
}

pub async fn update_by_id(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(record_id): Path<String>,
    body: Result<Json<InternshipRecord>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(record) = body?;
    user.require_access_to(&record.register_no)?;

    let lookup = record_id.clone();
    let existing = ctx
        .with_records(move |records| records.get(&lookup))
        .await?;
    user.require_access_to(&existing.register_no)?;

    let stored = ctx
        .with_records(move |records| records.update_by_id(&record_id, record))
        .await?;
    info!(record_id = %stored.record_id, "record updated");
    Ok(Json(json!({
        "success": true,
        "message": "Record updated successfully",
        "record": stored,
    })))
}

fn list_response(records: Vec<InternshipRecord>) -> Value {
    json!({
        "success": true,
        "count": records.len(),
        "data": records,
    })
}
