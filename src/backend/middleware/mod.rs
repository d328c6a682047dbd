//! Middleware Module
//!
//! HTTP middleware and request extractors shared by the handlers.
//!
//! - **`auth`** - Bearer token authentication for protected routes
//! - **`extract`** - JSON and path extractors that reject in the error envelope

pub mod auth;
pub mod extract;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
pub use extract::{ApiJson, ApiPath};
