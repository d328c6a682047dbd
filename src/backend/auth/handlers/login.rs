/**
 * Login Handler
 *
 * POST /api/v1/users/login
 *
 * # Authentication Process
 *
 * 1. Look up user by email
 * 2. Verify password using bcrypt
 * 3. Generate JWT access token
 * 4. Return token and user info
 *
 * # Security
 *
 * - Passwords are verified using bcrypt off the async runtime
 * - User passwords are never returned in responses
 */
use axum::extract::State;

use crate::backend::auth::IdentityProvider;
use crate::backend::error::BackendResult;
use crate::backend::middleware::ApiJson;
use crate::shared::envelope::{codes, ApiResponse};
use crate::shared::messaging::{LoginRequest, LoginResponse};

/// Login handler
///
/// # Errors
///
/// * `404 Not Found` - No account with this email
/// * `401 Unauthorized` - Wrong password
///
/// # Example Response
///
/// ```json
/// {
///   "version": 1,
///   "statusCode": 200,
///   "data": {
///     "user": { "id": "123e4567-...", "fullName": "Ada Lovelace", "email": "ada@example.com" },
///     "accessToken": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..."
///   },
///   "message": "Login successful",
///   "code": 2005
/// }
/// ```
pub async fn login(
    State(identity): State<IdentityProvider>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> BackendResult<ApiResponse<LoginResponse>> {
    tracing::info!("Login request for: {}", request.email);

    let response = identity.login(request).await?;

    Ok(ApiResponse::ok(response, "Login successful").with_code(codes::USER_LOGGED_IN))
}
