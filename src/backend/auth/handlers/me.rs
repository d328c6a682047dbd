/**
 * Current User Handler
 *
 * GET /api/v1/users/current-user
 *
 * Requires a valid bearer token. The account is re-read from the store so
 * profile changes show up without a new token.
 */
use axum::extract::State;

use crate::backend::auth::IdentityProvider;
use crate::backend::error::BackendResult;
use crate::backend::middleware::AuthUser;
use crate::shared::envelope::ApiResponse;
use crate::shared::messaging::UserSummary;

pub async fn current_user(
    State(identity): State<IdentityProvider>,
    AuthUser(auth): AuthUser,
) -> BackendResult<ApiResponse<UserSummary>> {
    let user = identity.get_user(auth.user_id).await?;
    Ok(ApiResponse::ok(user.to_summary(), "Current user fetched"))
}
