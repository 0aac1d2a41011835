// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints for the logged-in account.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    accounts::AccountError,
    auth::{Auth, AuthError},
    error::ApiError,
    models::{AccountProfile, ChangePasswordRequest, MessageResponse, UpdateUserRequest},
    state::AppState,
};

/// Confirm the session and return the account it belongs to.
///
/// A valid cookie for an account that no longer exists is treated like any
/// other dead session.
#[utoipa::path(
    get,
    path = "/validate-cookie",
    tag = "Users",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Session is valid", body = AccountProfile),
        (status = 401, description = "Session missing, invalid or expired; log in again"),
    )
)]
pub async fn validate_cookie(
    State(state): State<AppState>,
    Auth(session): Auth,
) -> Result<Json<AccountProfile>, Response> {
    match state.accounts.current(&session.email).await {
        Ok(account) => Ok(Json(account.into())),
        Err(AccountError::AccountNotFound) => Err(AuthError::UnknownAccount.into_response()),
        Err(e) => Err(ApiError::from(e).into_response()),
    }
}

/// Update profile fields. Changing the email re-issues the session cookie.
#[utoipa::path(
    put,
    path = "/update-user",
    request_body = UpdateUserRequest,
    tag = "Users",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Profile updated", body = AccountProfile),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Email belongs to another account"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(session): Auth,
    Json(request): Json<UpdateUserRequest>,
) -> Result<(HeaderMap, Json<AccountProfile>), ApiError> {
    let account = state
        .accounts
        .update_profile(&session.email, request)
        .await?;

    let mut headers = HeaderMap::new();
    if account.email != session.email {
        state
            .sessions
            .attach_session(&mut headers, &account.email)
            .map_err(ApiError::internal)?;
    }
    Ok((headers, Json(account.into())))
}

#[utoipa::path(
    put,
    path = "/change-password",
    request_body = ChangePasswordRequest,
    tag = "Users",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 401, description = "Not logged in or wrong current password"),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Auth(session): Auth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts
        .change_password(&session.email, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
