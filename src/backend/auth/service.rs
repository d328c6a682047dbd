/**
 * Identity Provider
 *
 * Registration, credential checks, session revocation and token-to-user
 * resolution over a `UserStore`. Both the HTTP middleware and the realtime
 * gateway authenticate through `IdentityProvider::authenticate`.
 */

use std::sync::Arc;

use uuid::Uuid;

use crate::backend::auth::sessions::{Claims, TokenKind, TokenPair, TokenService};
use crate::backend::auth::users::{normalize_email, User};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{NewUser, UserStore};
use crate::shared::messaging::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, UpdateAccountRequest,
};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const SEARCH_LIMIT: u32 = 20;

#[derive(Clone)]
pub struct IdentityProvider {
    users: Arc<dyn UserStore>,
    tokens: TokenService,
    bcrypt_cost: u32,
}

impl IdentityProvider {
    pub fn new(users: Arc<dyn UserStore>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new account
    ///
    /// `InvalidArgument` for a blank name, malformed email or short password;
    /// `Conflict` when the email is already registered.
    pub async fn register(&self, request: RegisterRequest) -> BackendResult<User> {
        let full_name = request.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(BackendError::invalid_argument("Full name is required"));
        }

        let email = normalize_email(&request.email);
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(BackendError::invalid_argument("Invalid email format"));
        }

        check_password_length(&request.password)?;

        if self.users.user_by_email(&email).await?.is_some() {
            tracing::warn!("[Auth] Email already registered: {}", email);
            return Err(BackendError::conflict("Email already registered"));
        }

        let password_hash = self.hash_password(request.password).await?;
        let bio = request.bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());

        let user = self
            .users
            .insert_user(NewUser {
                full_name,
                email,
                password_hash,
                bio,
            })
            .await
            .map_err(|e| match e {
                BackendError::Conflict { .. } => BackendError::conflict("Email already registered"),
                other => other,
            })?;

        tracing::info!("[Auth] User registered: {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Check credentials and issue an access and refresh token
    ///
    /// `NotFound` for an unknown email, `Unauthenticated` for a wrong password.
    pub async fn login(&self, request: LoginRequest) -> BackendResult<LoginResponse> {
        let email = normalize_email(&request.email);
        let user = self
            .users
            .user_by_email(&email)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))?;

        if !self.verify_password(request.password, user.password_hash.clone()).await? {
            tracing::warn!("[Auth] Wrong password for {}", user.id);
            return Err(BackendError::unauthenticated("Invalid credentials"));
        }

        let tokens = self.tokens.create_pair(user.id, &user.email, user.session_version)?;
        tracing::info!("[Auth] User logged in: {}", user.id);

        Ok(LoginResponse {
            user: user.to_summary(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Resolve an access token to an existing user
    ///
    /// Tokens issued before the account's last logout or password change are
    /// refused.
    pub async fn authenticate(&self, token: &str) -> BackendResult<User> {
        let claims = self.tokens.verify_kind(token, TokenKind::Access)?;
        self.current_session_user(&claims).await
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> BackendResult<TokenPair> {
        let claims = self.tokens.verify_kind(refresh_token, TokenKind::Refresh)?;
        let user = self.current_session_user(&claims).await?;

        tracing::debug!("[Auth] Tokens refreshed for {}", user.id);
        self.tokens.create_pair(user.id, &user.email, user.session_version)
    }

    /// Revoke every token of the user
    pub async fn logout(&self, user_id: Uuid) -> BackendResult<()> {
        let version = self.users.bump_session_version(user_id).await?;
        tracing::info!("[Auth] User logged out: {} (session version {})", user_id, version);
        Ok(())
    }

    /// Replace the password after checking the old one
    ///
    /// `InvalidArgument` for a wrong old password or a too short new one. On
    /// success every token of the user is revoked.
    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> BackendResult<()> {
        let user = self.get_user(user_id).await?;

        if !self.verify_password(request.old_password, user.password_hash).await? {
            tracing::warn!("[Auth] Wrong old password for {}", user_id);
            return Err(BackendError::invalid_argument("Invalid old password"));
        }
        check_password_length(&request.new_password)?;

        let password_hash = self.hash_password(request.new_password).await?;
        self.users.set_password(user_id, &password_hash).await?;

        tracing::info!("[Auth] Password changed for {}", user_id);
        Ok(())
    }

    /// Replace the display name and bio
    pub async fn update_account(&self, user_id: Uuid, request: UpdateAccountRequest) -> BackendResult<User> {
        let full_name = request.full_name.trim();
        if full_name.is_empty() {
            return Err(BackendError::invalid_argument("Full name is required"));
        }
        let bio = request.bio.as_deref().map(str::trim).filter(|b| !b.is_empty());

        let user = self.users.update_account(user_id, full_name, bio).await?;
        tracing::info!("[Auth] Account updated: {}", user_id);
        Ok(user)
    }

    async fn current_session_user(&self, claims: &Claims) -> BackendResult<User> {
        let user = self
            .users
            .user_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| BackendError::unauthenticated("User no longer exists"))?;

        if claims.ver != user.session_version {
            tracing::debug!(
                "[Auth] Token for {} has session version {}, current is {}",
                user.id,
                claims.ver,
                user.session_version
            );
            return Err(BackendError::unauthenticated("Session has been revoked"));
        }
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> BackendResult<User> {
        self.users
            .user_by_id(id)
            .await?
            .ok_or_else(|| BackendError::not_found("User not found"))
    }

    /// Keyword search on name and email, never returning the caller
    pub async fn search(&self, keyword: &str, caller: Uuid) -> BackendResult<Vec<User>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(BackendError::invalid_argument("Search keyword is required"));
        }
        self.users.search_users(keyword, caller, SEARCH_LIMIT).await
    }

    async fn hash_password(&self, password: String) -> BackendResult<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| BackendError::internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| BackendError::internal(format!("Failed to hash password: {}", e)))
    }

    async fn verify_password(&self, password: String, hash: String) -> BackendResult<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| BackendError::internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| BackendError::internal(format!("Failed to verify password: {}", e)))
    }
}

fn check_password_length(password: &str) -> BackendResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BackendError::invalid_argument(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
