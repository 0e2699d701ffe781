#![forbid(unsafe_code)]

use crate::auth::CurrentUser;
use crate::clock::{duration_ms, now_ms};
use crate::error::ApiError;
use crate::state::AppContext;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use it_core::{Role, Username};
use it_storage::password::constant_time_eq;
use it_storage::{Account, NewAccount, Session, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    /// Required for anonymous teacher sign-up; see `INTERNTRACK_TEACHER_SECRET`.
    #[serde(default)]
    pub teacher_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub username: String,
    pub role: Role,
    pub folder_id: Option<String>,
}

impl From<Account> for UserView {
    fn from(account: Account) -> Self {
        Self {
            username: account.username.into_string(),
            role: account.role,
            folder_id: account.folder_ref,
        }
    }
}

/// Self-registration creates students. A teacher account needs either a
/// teacher session on the request or the configured teacher secret.
pub async fn register(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let username = Username::try_new(body.username)?;
    if body.password.is_empty() {
        return Err(ApiError::bad_request("Password is required"));
    }
    let role = body.role.unwrap_or(Role::Student);
    if role == Role::Teacher {
        let caller = CurrentUser::optional(&headers, &ctx).await?;
        if !may_create_teacher(&ctx, caller.as_ref(), body.teacher_secret.as_deref()) {
            warn!(username = %username, "teacher registration refused");
            return Err(ApiError::Forbidden);
        }
    }

    let new_account = NewAccount {
        username: username.clone(),
        password: body.password,
        role,
        folder_ref: None,
        created_at_ms: now_ms(),
    };
    ctx.with_accounts(move |accounts| accounts.create(new_account))
        .await?;

    let folder_ref = match ctx.blobs.create_folder(username.as_str()).await {
        Ok(folder_ref) => folder_ref,
        Err(err) => {
            warn!(username = %username, error = %err, "folder creation failed");
            let rollback = username.clone();
            ctx.with_accounts(move |accounts| accounts.delete(&rollback))
                .await?;
            return Err(ApiError::Internal(
                "Failed to create storage folder".to_string(),
            ));
        }
    };

    let ttl_ms = duration_ms(ctx.config.session_ttl);
    let (account, session) = ctx
        .with_accounts(move |accounts| {
            accounts.set_folder_ref(&username, &folder_ref)?;
            let account = accounts
                .find_by_username(&username)?
                .ok_or(StoreError::UnknownAccount)?;
            let session = accounts.create_session(&account.username, now_ms(), ttl_ms)?;
            Ok((account, session))
        })
        .await?;

    info!(username = %account.username, role = account.role.as_str(), "account registered");
    Ok(Json(session_response(account, session)))
}

fn may_create_teacher(
    ctx: &AppContext,
    caller: Option<&CurrentUser>,
    secret: Option<&str>,
) -> bool {
    if caller.is_some_and(CurrentUser::is_teacher) {
        return true;
    }
    match (ctx.config.teacher_secret.as_deref(), secret) {
        (Some(expected), Some(given)) => constant_time_eq(expected.as_bytes(), given.as_bytes()),
        _ => false,
    }
}

pub async fn login(
    State(ctx): State<AppContext>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let invalid = || ApiError::bad_request("Invalid credentials");
    let username = Username::try_new(body.username).map_err(|_| invalid())?;

    let ttl_ms = duration_ms(ctx.config.session_ttl);
    let login = ctx
        .with_accounts(move |accounts| {
            let Some(account) = accounts.verify_credentials(&username, &body.password)? else {
                return Ok(None);
            };
            let session = accounts.create_session(&account.username, now_ms(), ttl_ms)?;
            Ok(Some((account, session)))
        })
        .await?;

    let Some((account, session)) = login else {
        return Err(invalid());
    };
    info!(username = %account.username, "login");
    Ok(Json(session_response(account, session)))
}

pub async fn logout(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let token = user.token.clone();
    ctx.with_accounts(move |accounts| {
        accounts.revoke_session(&token)?;
        accounts.purge_expired_sessions(now_ms())
    })
    .await?;
    Ok(Json(json!({ "success": true, "message": "Logged out" })))
}

fn session_response(account: Account, session: Session) -> Value {
    json!({
        "success": true,
        "token": session.token,
        "expiresAt": session.expires_at_ms,
        "user": UserView::from(account),
    })
}
