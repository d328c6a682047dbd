/**
 * User Lookup Handlers
 *
 * GET /api/v1/users/search/{query} - keyword search on name and email
 * GET /api/v1/users/{userId}       - single user by id
 */
use axum::extract::State;
use uuid::Uuid;

use crate::backend::auth::IdentityProvider;
use crate::backend::error::BackendResult;
use crate::backend::middleware::{ApiPath, AuthUser};
use crate::shared::envelope::{codes, ApiResponse};
use crate::shared::messaging::UserSummary;

/// Case-insensitive search; the caller is never part of the result
pub async fn search_users(
    State(identity): State<IdentityProvider>,
    AuthUser(auth): AuthUser,
    ApiPath(query): ApiPath<String>,
) -> BackendResult<ApiResponse<Vec<UserSummary>>> {
    let users = identity.search(&query, auth.user_id).await?;
    tracing::debug!("Search '{}' by {} returned {} users", query, auth.user_id, users.len());

    let summaries = users.iter().map(|u| u.to_summary()).collect();
    Ok(ApiResponse::ok(summaries, "Users fetched").with_code(codes::USERS_SEARCHED))
}

pub async fn get_user(
    State(identity): State<IdentityProvider>,
    AuthUser(_auth): AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> BackendResult<ApiResponse<UserSummary>> {
    let user = identity.get_user(user_id).await?;
    Ok(ApiResponse::ok(user.to_summary(), "User fetched").with_code(codes::USER_FETCHED))
}
