//! Authentication Module
//!
//! User accounts, password credentials and bearer tokens.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - JWT token management
//! ├── service.rs      - Identity provider (register, login, authenticate)
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: name, email and password → user created (no token)
//! 2. **Login**: email and password → credentials verified → access and refresh JWTs returned
//! 3. **Authenticate**: access JWT → user, used by the HTTP middleware and the gateway upgrade
//! 4. **Refresh**: refresh JWT → new token pair
//! 5. **Logout / change password**: the session version is bumped, revoking
//!    every outstanding token and closing the user's live connections
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens are HS256 JWTs with a configurable lifetime
//! - A token for a deleted account, or one issued before the current session
//!   version, is rejected with 401

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// Identity provider over a user store
pub mod service;

/// HTTP handlers for user endpoints
pub mod handlers;

pub use service::IdentityProvider;
pub use sessions::{Claims, TokenKind, TokenPair, TokenService};
pub use users::User;
