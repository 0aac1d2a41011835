// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::{accounts::AccountError, reset::ResetError};

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    /// Log `detail` and return a generic 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::AccountNotFound => ApiError::not_found("User not found"),
            AccountError::EmailAlreadyRegistered => ApiError::bad_request("Email already registered"),
            AccountError::EmailConflict => ApiError::conflict("Email already registered"),
            AccountError::BadCredentials => ApiError::unauthorized("Incorrect email or password"),
            AccountError::InvalidInput(message) => ApiError::bad_request(message),
            AccountError::UnsupportedImageType(_) => {
                ApiError::unsupported_media_type("Profile image must be an image")
            }
            AccountError::EmptyImage => ApiError::bad_request("Profile image is empty"),
            AccountError::ImageTooLarge => {
                ApiError::payload_too_large("Profile image must be at most 5 MiB")
            }
            AccountError::ImageNotFound => ApiError::not_found("Profile image not found"),
            AccountError::Store(e) => ApiError::internal(e),
            AccountError::Password(e) => ApiError::internal(e),
        }
    }
}

impl From<ResetError> for ApiError {
    fn from(error: ResetError) -> Self {
        match error {
            ResetError::AccountNotFound => ApiError::not_found("User not found"),
            ResetError::InvalidResetCode => ApiError::bad_request("Invalid reset code"),
            ResetError::ResetCodeExpired => ApiError::bad_request("Reset code has expired"),
            ResetError::Store(e) => ApiError::internal(e),
            ResetError::Delivery(e) => ApiError::internal(format!("reset code delivery: {e}")),
            ResetError::Password(e) => ApiError::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{email::EmailError, storage::StoreError};
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let conflict = ApiError::conflict("taken");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn account_errors_map_to_statuses() {
        let cases = [
            (AccountError::AccountNotFound, StatusCode::NOT_FOUND),
            (AccountError::EmailAlreadyRegistered, StatusCode::BAD_REQUEST),
            (AccountError::EmailConflict, StatusCode::CONFLICT),
            (AccountError::BadCredentials, StatusCode::UNAUTHORIZED),
            (
                AccountError::UnsupportedImageType("text/plain".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (AccountError::ImageTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (AccountError::ImageNotFound, StatusCode::NOT_FOUND),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn reset_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(ResetError::InvalidResetCode).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ResetError::ResetCodeExpired).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ResetError::AccountNotFound).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn backend_failures_hide_details() {
        let store = ApiError::from(AccountError::Store(StoreError::Backend(
            "connection refused to mongodb://10.0.0.5".into(),
        )));
        assert_eq!(store.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.message, "Internal server error");

        let delivery = ApiError::from(ResetError::Delivery(EmailError::Transport("503 service unavailable".into())));
        assert_eq!(delivery.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(delivery.message, "Internal server error");
    }
}
