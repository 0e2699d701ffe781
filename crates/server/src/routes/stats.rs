#![forbid(unsafe_code)]

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppContext;
use axum::Json;
use axum::extract::State;
use it_core::{StudentStats, student_stats};
use it_storage::StoreError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StudentStats,
}

/// A missing record file counts as no records.
pub async fn students(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<StatsResponse>, ApiError> {
    user.require_teacher()?;
    let records = ctx
        .with_records(|records| match records.list() {
            Err(StoreError::NotFound) => Ok(Vec::new()),
            other => other,
        })
        .await?;
    Ok(Json(StatsResponse {
        success: true,
        stats: student_stats(&records),
    }))
}
