// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    accounts::AccountError, auth::Auth, error::ApiError, models::AccountProfile, state::AppState,
};

#[utoipa::path(
    get,
    path = "/psychologists",
    tag = "Psychologists",
    security(("session_cookie" = [])),
    responses(
        (status = 200, body = [AccountProfile]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_psychologists(
    State(state): State<AppState>,
    Auth(_session): Auth,
) -> Result<Json<Vec<AccountProfile>>, ApiError> {
    let psychologists = state.accounts.list_psychologists().await?;
    Ok(Json(psychologists.iter().map(AccountProfile::from).collect()))
}

#[utoipa::path(
    get,
    path = "/psychologists/{psychologist_id}",
    params(
        ("psychologist_id" = String, Path, description = "Account id of the psychologist")
    ),
    tag = "Psychologists",
    security(("session_cookie" = [])),
    responses(
        (status = 200, body = AccountProfile),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No psychologist with that id")
    )
)]
pub async fn get_psychologist(
    Path(psychologist_id): Path<String>,
    State(state): State<AppState>,
    Auth(_session): Auth,
) -> Result<Json<AccountProfile>, ApiError> {
    let account = state
        .accounts
        .psychologist(&psychologist_id)
        .await
        .map_err(|e| match e {
            AccountError::AccountNotFound => ApiError::not_found("Psychologist not found"),
            other => other.into(),
        })?;
    Ok(Json(account.into()))
}
