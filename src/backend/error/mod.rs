//! Backend Error Module
//!
//! This module defines the error taxonomy of the backend server. Stores,
//! services and handlers all return [`BackendError`], which converts into an
//! HTTP response carrying the shared error envelope.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions and status mapping
//! └── conversion.rs - sqlx conversion and IntoResponse implementations
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use chatline::backend::error::{BackendError, BackendResult};
//!
//! fn find(id: u32) -> BackendResult<u32> {
//!     if id == 0 {
//!         return Err(BackendError::not_found("Nothing with id 0"));
//!     }
//!     Ok(id)
//! }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{BackendError, BackendResult};
