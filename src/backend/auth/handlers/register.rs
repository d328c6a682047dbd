/**
 * Registration Handler
 *
 * POST /api/v1/users/register
 *
 * # Registration Process
 *
 * 1. Validate name, email format and password length
 * 2. Hash the password with bcrypt
 * 3. Insert the user (duplicate emails are rejected with 409)
 * 4. Return the public user record
 *
 * The client logs in separately to obtain an access token.
 */
use axum::extract::State;

use crate::backend::auth::IdentityProvider;
use crate::backend::error::BackendResult;
use crate::backend::middleware::ApiJson;
use crate::shared::envelope::{codes, ApiResponse};
use crate::shared::messaging::{RegisterRequest, UserSummary};

/// Registration handler
///
/// # Errors
///
/// * `400 Bad Request` - Blank name, malformed email or short password
/// * `409 Conflict` - Email already registered
///
/// # Example Request
///
/// ```http
/// POST /api/v1/users/register HTTP/1.1
/// Content-Type: application/json
///
/// { "fullName": "Ada Lovelace", "email": "ada@example.com", "password": "analytical" }
/// ```
pub async fn register(
    State(identity): State<IdentityProvider>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> BackendResult<ApiResponse<UserSummary>> {
    tracing::info!("Registration request for: {}", request.email);

    let user = identity.register(request).await?;

    Ok(ApiResponse::created(user.to_summary(), "User registered successfully").with_code(codes::USER_REGISTERED))
}
