// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile image upload, download and removal.
//!
//! Uploads are the raw image bytes with the image's MIME type as
//! `Content-Type`; there is no multipart envelope.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};

use crate::{auth::Auth, error::ApiError, models::AccountProfile, state::AppState};

#[utoipa::path(
    put,
    path = "/profile-image",
    request_body(content = Vec<u8>, content_type = "image/*", description = "Raw image bytes"),
    tag = "Profile Images",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Image stored", body = AccountProfile),
        (status = 401, description = "Not logged in"),
        (status = 413, description = "Image larger than 5 MiB"),
        (status = 415, description = "Body is not an image")
    )
)]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Auth(session): Auth,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AccountProfile>, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let account = state
        .accounts
        .set_profile_image(&session.email, &content_type, body.to_vec())
        .await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    delete,
    path = "/profile-image",
    tag = "Profile Images",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Image removed", body = AccountProfile),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No profile image set")
    )
)]
pub async fn delete_profile_image(
    State(state): State<AppState>,
    Auth(session): Auth,
) -> Result<Json<AccountProfile>, ApiError> {
    let account = state.accounts.remove_profile_image(&session.email).await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/profile-image",
    params(
        ("user_id" = String, Path, description = "Account id")
    ),
    tag = "Profile Images",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Image bytes", body = Vec<u8>, content_type = "image/*"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such account or no image")
    )
)]
pub async fn get_profile_image(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Auth(_session): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let (content_type, bytes) = state.accounts.profile_image(&user_id).await?;
    let content_type = HeaderValue::from_str(&content_type).map_err(ApiError::internal)?;
    Ok(([(CONTENT_TYPE, content_type)], bytes))
}
