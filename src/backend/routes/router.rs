/**
 * Router Configuration
 *
 * Assembles every route into a single Axum router.
 *
 * # Route Groups
 *
 * 1. **Public API**: `/api/v1/users/register`, `/api/v1/users/login`,
 *    `/api/v1/users/refresh-token`
 * 2. **Protected API**: everything else under `/api/v1`, behind the bearer
 *    token middleware
 * 3. **Gateway**: `GET /ws`, authenticated during the upgrade itself
 * 4. **Media files**: `GET /media/{file}` served from the media directory
 *    with `X-Content-Type-Options: nosniff`
 * 5. **Health**: `GET /health`
 *
 * Unknown routes get a 404 in the error envelope.
 */
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::backend::auth::handlers as users;
use crate::backend::error::BackendError;
use crate::backend::media::{upload_media, MEDIA_URL_PREFIX};
use crate::backend::messaging::handlers as chat;
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::{ws_handler, Gateway};
use crate::backend::server::state::AppState;
use crate::shared::envelope::ApiResponse;

/// API version prefix
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub gateway_open: bool,
    pub online_users: usize,
}

async fn health(State(gateway): State<Arc<Gateway>>) -> ApiResponse<HealthStatus> {
    ApiResponse::ok(
        HealthStatus {
            status: "ok",
            gateway_open: gateway.is_open(),
            online_users: gateway.online_users(),
        },
        "Healthy",
    )
}

async fn not_found() -> BackendError {
    BackendError::not_found("Route not found")
}

/// Routes reachable without a token
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh-token", post(users::refresh_token))
}

/// Routes behind the bearer token middleware
fn protected_routes(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users/current-user", get(users::current_user))
        .route("/users/logout", post(users::logout))
        .route("/users/change-password", post(users::change_password))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/search/{query}", get(users::search_users))
        .route("/users/{user_id}", get(users::get_user))
        .route("/chat/individual/create-chat", post(chat::create_chat))
        .route("/chat/individual/get-chats", get(chat::get_chats))
        .route("/chat/individual/send-message/{chat_id}", post(chat::send_message))
        .route("/chat/individual/get-messages/{chat_id}", get(chat::get_messages))
        .route(
            "/chat/individual/get-sliced-messages/{chat_id}/{page}",
            get(chat::get_sliced_messages),
        )
        .route("/chat/individual/editMessage/{message_id}", put(chat::edit_message))
        .route(
            "/media/upload",
            post(upload_media).layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes)),
        )
        .route_layer(middleware::from_fn_with_state(app_state.clone(), auth_middleware))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let api = public_routes().merge(protected_routes(&app_state));
    let media = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .service(ServeDir::new(&app_state.config.media_dir));

    Router::new()
        .nest(API_PREFIX, api)
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .nest_service(MEDIA_URL_PREFIX, media)
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}
