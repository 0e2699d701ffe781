#![forbid(unsafe_code)]

use crate::clock::now_ms;
use crate::error::ApiError;
use crate::state::AppContext;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use it_core::Role;
use it_storage::Account;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub account: Account,
    pub token: String,
}

impl CurrentUser {
    pub fn is_teacher(&self) -> bool {
        self.account.role == Role::Teacher
    }

    pub fn username(&self) -> &str {
        self.account.username.as_str()
    }

    pub fn require_teacher(&self) -> Result<(), ApiError> {
        if self.is_teacher() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Teachers may act on any student; students only on themselves.
    pub fn require_access_to(&self, register_no: &str) -> Result<(), ApiError> {
        if self.is_teacher() || self.username() == register_no.trim() {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl CurrentUser {
    /// Resolves the caller on routes open to anonymous requests. A present but
    /// invalid token is still rejected.
    pub async fn optional(
        headers: &HeaderMap,
        ctx: &AppContext,
    ) -> Result<Option<Self>, ApiError> {
        if !headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }
        Self::resolve(headers, ctx).await.map(Some)
    }

    async fn resolve(headers: &HeaderMap, ctx: &AppContext) -> Result<Self, ApiError> {
        let token = bearer_token(headers)?;
        let lookup = token.clone();
        let account = ctx
            .with_accounts(move |accounts| accounts.resolve_session(&lookup, now_ms()))
            .await?
            .ok_or(ApiError::Unauthorized("Session expired or invalid"))?;
        Ok(Self { account, token })
    }
}

impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        Self::resolve(&parts.headers, ctx).await
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::Unauthorized("No token, authorization denied"))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Malformed authorization header"))?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized("Malformed authorization header"))?;
    Ok(token.to_string())
}
