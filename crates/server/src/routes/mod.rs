#![forbid(unsafe_code)]

pub mod auth;
pub mod documents;
pub mod drive;
pub mod records;
pub mod stats;

use crate::state::AppContext;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn build_router(ctx: AppContext) -> Router {
    let cors = cors_layer(ctx.config.cors_origin.as_deref());
    let body_limit = DefaultBodyLimit::max(ctx.config.max_upload_bytes);

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/api/excel/data", get(records::list_all))
        .route("/api/excel/student/{register_no}", get(records::list_student))
        .route("/api/excel/add", post(records::add))
        .route("/api/excel/update/{ordinal}", put(records::update_at))
        .route(
            "/api/excel/records/{record_id}",
            get(records::get_one).put(records::update_by_id),
        )
        .route("/api/documents", get(documents::list))
        .route("/api/documents/upload", post(documents::upload))
        .route("/api/documents/verify", post(documents::verify))
        .route("/api/students/stats", get(stats::students))
        .route("/api/drive/create-folder", post(drive::create_folder))
        .route("/api/drive/upload-records", post(drive::upload_records))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(err)) => {
            warn!(error = %err, "invalid cors origin; allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
