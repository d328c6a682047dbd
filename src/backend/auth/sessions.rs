/**
 * Session Management and JWT Tokens
 *
 * This module issues and verifies the HS256 tokens used by the HTTP API and
 * the realtime gateway. Access tokens authorize requests; refresh tokens,
 * which live longer, can only be exchanged for a new pair.
 *
 * Every token carries the account's session version. Logging out or
 * changing the password bumps the version, which revokes every token issued
 * before it.
 */

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};

/// Which of the two token types a JWT is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[default]
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Session version of the account when the token was issued
    #[serde(default)]
    pub ver: i64,
    #[serde(default)]
    pub kind: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

impl Claims {
    pub fn user_id(&self) -> BackendResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| BackendError::unauthenticated("Invalid user ID in token"))
    }
}

/// An access token and the refresh token issued with it
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies access and refresh tokens
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<str>,
    ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl TokenService {
    /// Refresh tokens get the same lifetime as access tokens until
    /// [`TokenService::with_refresh_ttl`] says otherwise
    pub fn new(secret: impl AsRef<str>, ttl_secs: u64) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
            ttl_secs,
            refresh_ttl_secs: ttl_secs,
        }
    }

    pub fn with_refresh_ttl(mut self, refresh_ttl_secs: u64) -> Self {
        self.refresh_ttl_secs = refresh_ttl_secs;
        self
    }

    /// Create an access token for a user
    pub fn create_token(&self, user_id: Uuid, email: &str, version: i64) -> BackendResult<String> {
        self.sign(user_id, email, version, TokenKind::Access, self.ttl_secs)
    }

    /// Create an access token and a refresh token for a user
    pub fn create_pair(&self, user_id: Uuid, email: &str, version: i64) -> BackendResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.create_token(user_id, email, version)?,
            refresh_token: self.sign(user_id, email, version, TokenKind::Refresh, self.refresh_ttl_secs)?,
        })
    }

    fn sign(&self, user_id: Uuid, email: &str, version: i64, kind: TokenKind, ttl_secs: u64) -> BackendResult<String> {
        let now = now_secs();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            ver: version,
            kind,
            exp: now + ttl_secs,
            iat: now,
        };

        let key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &key).map_err(|e| {
            tracing::error!("[Auth] Failed to create token: {:?}", e);
            BackendError::internal("Failed to create token")
        })
    }

    /// Verify and decode a JWT token of either kind
    pub fn verify_token(&self, token: &str) -> BackendResult<Claims> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        decode::<Claims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("[Auth] Token rejected: {:?}", e);
                BackendError::unauthenticated("Invalid or expired token")
            })
    }

    /// Verify a token and require it to be of `kind`
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> BackendResult<Claims> {
        let claims = self.verify_token(token)?;
        if claims.kind != kind {
            tracing::debug!("[Auth] Expected a {:?} token, got {:?}", kind, claims.kind);
            return Err(BackendError::unauthenticated("Invalid or expired token"));
        }
        Ok(claims)
    }

    /// Extract user ID from an access token
    pub fn user_id_from_token(&self, token: &str) -> BackendResult<Uuid> {
        self.verify_kind(token, TokenKind::Access)?.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> TokenService {
        TokenService::new("test-secret", 3600).with_refresh_ttl(7200)
    }

    #[test]
    fn test_create_and_verify_token() {
        let user_id = Uuid::new_v4();
        let token = service().create_token(user_id, "test@example.com", 3).unwrap();
        assert!(!token.is_empty());

        let claims = service().verify_token(&token).unwrap();
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.ver, 3);
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_user_id_from_token() {
        let user_id = Uuid::new_v4();
        let token = service().create_token(user_id, "test@example.com", 0).unwrap();
        assert_eq!(service().user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_pair_kinds_are_not_interchangeable() {
        let user_id = Uuid::new_v4();
        let pair = service().create_pair(user_id, "test@example.com", 0).unwrap();

        let refresh = service().verify_kind(&pair.refresh_token, TokenKind::Refresh).unwrap();
        let access = service().verify_kind(&pair.access_token, TokenKind::Access).unwrap();
        assert!(refresh.exp > access.exp);

        assert_matches!(
            service().user_id_from_token(&pair.refresh_token),
            Err(BackendError::Unauthenticated { .. })
        );
        assert_matches!(
            service().verify_kind(&pair.access_token, TokenKind::Refresh),
            Err(BackendError::Unauthenticated { .. })
        );
    }

    #[test]
    fn test_verify_invalid_token() {
        let err = service().verify_token("invalid.token.here").unwrap_err();
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service().create_token(Uuid::new_v4(), "a@b.c", 0).unwrap();
        let other = TokenService::new("other-secret", 3600);
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Default validation allows 60s of leeway
        let expired = TokenService::new("test-secret", 0);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "a@b.c".to_string(),
            ver: 0,
            kind: TokenKind::Access,
            exp: now_secs() - 120,
            iat: now_secs() - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(expired.verify_token(&token).is_err());
    }
}
