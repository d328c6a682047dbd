//! Authentication Handlers Module
//!
//! HTTP handlers for the `/api/v1/users` endpoints.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs       - Module exports and documentation
//! ├── register.rs  - User registration handler
//! ├── login.rs     - User authentication handler
//! ├── me.rs        - Current user handler
//! ├── account.rs   - Refresh, logout, password and profile handlers
//! └── users.rs     - Search and lookup handlers
//! ```
//!
//! # Handlers
//!
//! - **`register`** - POST /users/register - User registration
//! - **`login`** - POST /users/login - User authentication
//! - **`refresh_token`** - POST /users/refresh-token - New token pair
//! - **`logout`** - POST /users/logout - Revoke all sessions
//! - **`change_password`** - POST /users/change-password - New password, all sessions revoked
//! - **`update_account`** - PATCH /users/update-account - Name and bio
//! - **`current_user`** - GET /users/current-user - Current user info
//! - **`search_users`** - GET /users/search/{query} - Keyword search
//! - **`get_user`** - GET /users/{userId} - User by id

/// Registration handler
pub mod register;

/// Login handler
pub mod login;

/// Current user handler
pub mod me;

/// Session and profile handlers
pub mod account;

/// Search and lookup handlers
pub mod users;

pub use account::{change_password, logout, refresh_token, update_account};
pub use login::login;
pub use me::current_user;
pub use register::register;
pub use users::{get_user, search_users};
