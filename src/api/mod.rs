// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, MatchedPath},
    http::{
        header::CONTENT_TYPE, header::InvalidHeaderValue, request, HeaderValue, Method, Request,
    },
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, Span};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    accounts::MAX_IMAGE_BYTES,
    auth::{Role, SESSION_COOKIE_NAME},
    models::{
        AccountProfile, ChangePasswordRequest, ForgotPasswordRequest, LoginForm, LoginRequest,
        MessageResponse, ResetPasswordRequest, SignupRequest, UpdateUserRequest,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod images;
pub mod psychologists;
pub mod users;

/// Room for headers and framing on top of the largest accepted image.
const UPLOAD_SLACK_BYTES: usize = 64 * 1024;

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let routes = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
        .route("/validate-cookie", get(users::validate_cookie))
        .route("/update-user", put(users::update_user))
        .route("/change-password", put(users::change_password))
        .route("/psychologists", get(psychologists::list_psychologists))
        .route(
            "/psychologists/{psychologist_id}",
            get(psychologists::get_psychologist),
        )
        .route(
            "/profile-image",
            put(images::upload_profile_image)
                .delete(images::delete_profile_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + UPLOAD_SLACK_BYTES)),
        )
        .route(
            "/users/{user_id}/profile-image",
            get(images::get_profile_image),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    routes
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors),
        )
}

/// Credentialed CORS for the single front-end origin.
///
/// Requests from any other origin get no `Access-Control-Allow-Origin`.
pub fn cors_layer(frontend_origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = HeaderValue::from_str(frontend_origin)?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |candidate: &HeaderValue, _: &request::Parts| *candidate == origin,
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true))
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::signup,
        auth::logout,
        auth::forgot_password,
        auth::reset_password,
        users::validate_cookie,
        users::update_user,
        users::change_password,
        psychologists::list_psychologists,
        psychologists::get_psychologist,
        images::upload_profile_image,
        images::delete_profile_image,
        images::get_profile_image,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            AccountProfile,
            Role,
            LoginRequest,
            LoginForm,
            SignupRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            ChangePasswordRequest,
            UpdateUserRequest,
            MessageResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SessionCookieAddon),
    tags(
        (name = "Auth", description = "Login, signup, logout and password recovery"),
        (name = "Users", description = "The logged-in account"),
        (name = "Psychologists", description = "Psychologist directory"),
        (name = "Profile Images", description = "Profile image storage"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
