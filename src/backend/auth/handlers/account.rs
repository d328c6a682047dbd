/**
 * Account Handlers
 *
 * POST  /api/v1/users/refresh-token   (public)
 * POST  /api/v1/users/logout
 * POST  /api/v1/users/change-password
 * PATCH /api/v1/users/update-account
 *
 * Logout and password change revoke every token of the account and close
 * its live gateway connections, so other devices are signed out at once.
 */
use std::sync::Arc;

use axum::extract::State;
use serde_json::{json, Value};

use crate::backend::auth::IdentityProvider;
use crate::backend::error::BackendResult;
use crate::backend::middleware::{ApiJson, AuthUser};
use crate::backend::realtime::Gateway;
use crate::shared::envelope::ApiResponse;
use crate::shared::messaging::{
    ChangePasswordRequest, RefreshTokenRequest, TokenResponse, UpdateAccountRequest, UserSummary,
};

/// Exchange a refresh token for a new pair
///
/// # Errors
///
/// * `401 Unauthorized` - Invalid, expired or revoked refresh token
pub async fn refresh_token(
    State(identity): State<IdentityProvider>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> BackendResult<ApiResponse<TokenResponse>> {
    let pair = identity.refresh(&request.refresh_token).await?;

    Ok(ApiResponse::ok(
        TokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
        "Access token refreshed",
    ))
}

pub async fn logout(
    State(identity): State<IdentityProvider>,
    State(gateway): State<Arc<Gateway>>,
    AuthUser(user): AuthUser,
) -> BackendResult<ApiResponse<Value>> {
    identity.logout(user.user_id).await?;
    gateway.disconnect_user(user.user_id);

    Ok(ApiResponse::ok(json!({}), "User logged out"))
}

/// Change the password of the caller
///
/// # Errors
///
/// * `400 Bad Request` - Wrong old password or too short new password
pub async fn change_password(
    State(identity): State<IdentityProvider>,
    State(gateway): State<Arc<Gateway>>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> BackendResult<ApiResponse<Value>> {
    identity.change_password(user.user_id, request).await?;
    gateway.disconnect_user(user.user_id);

    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

pub async fn update_account(
    State(identity): State<IdentityProvider>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> BackendResult<ApiResponse<UserSummary>> {
    let updated = identity.update_account(user.user_id, request).await?;
    Ok(ApiResponse::ok(updated.to_summary(), "Account details updated successfully"))
}
