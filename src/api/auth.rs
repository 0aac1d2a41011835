// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, signup, logout and password recovery.
//!
//! Successful login and signup respond with a `Set-Cookie` for the session.
//! Logout only asks the browser to drop the cookie.

use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};

use crate::{
    error::ApiError,
    models::{
        AccountProfile, ForgotPasswordRequest, LoginForm, LoginRequest, MessageResponse,
        ResetPasswordRequest, SignupRequest,
    },
    state::AppState,
};

/// Login credentials from either a form-urlencoded `username`/`password`
/// body or a JSON `email`/`password` body, chosen by `Content-Type`.
pub struct LoginCredentials(pub LoginRequest);

impl FromRequest<AppState> for LoginCredentials {
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| {
                value
                    .to_ascii_lowercase()
                    .starts_with("application/x-www-form-urlencoded")
            });

        if is_form {
            let Form(form) = Form::<LoginForm>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(form.into()))
        } else {
            let Json(request) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(request))
        }
    }
}

fn with_session(state: &AppState, email: &str) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    state
        .sessions
        .attach_session(&mut headers, email)
        .map_err(ApiError::internal)?;
    Ok(headers)
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(
        content(
            (LoginForm = "application/x-www-form-urlencoded"),
            (LoginRequest = "application/json")
        )
    ),
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in; session cookie set", body = AccountProfile),
        (status = 401, description = "Incorrect email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    LoginCredentials(request): LoginCredentials,
) -> Result<(HeaderMap, Json<AccountProfile>), ApiError> {
    let account = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    let headers = with_session(&state, &account.email)?;
    Ok((headers, Json(account.into())))
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created; session cookie set", body = AccountProfile),
        (status = 400, description = "Email already registered"),
        (status = 409, description = "Email registered concurrently")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AccountProfile>), ApiError> {
    let account = state.accounts.signup(request).await?;
    let headers = with_session(&state, &account.email)?;
    Ok((StatusCode::CREATED, headers, Json(account.into())))
}

/// Clear the session cookie. The token itself stays valid until it expires.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    responses((status = 200, description = "Session cookie cleared", body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>) -> (HeaderMap, Json<MessageResponse>) {
    let mut headers = HeaderMap::new();
    state.sessions.clear_session(&mut headers);
    (headers, Json(MessageResponse::new("Successfully logged out")))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Reset code emailed", body = MessageResponse),
        (status = 404, description = "No account with that email"),
        (status = 500, description = "Email could not be sent")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.resets.request_reset(&request.email).await?;
    Ok(Json(MessageResponse::new(
        "Password reset code sent to your email",
    )))
}

#[utoipa::path(
    post,
    path = "/reset-password",
    request_body = ResetPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset code"),
        (status = 404, description = "No account with that email")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .resets
        .confirm_reset(&request.email, &request.code, &request.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password reset successful")))
}
