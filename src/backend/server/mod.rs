//! Server Module
//!
//! Server initialization and the application state.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Store selection (Postgres or in-memory)
//! └── init.rs         - Service wiring and app creation
//! ```

/// Application state management
pub mod state;

/// Store selection
pub mod config;

/// Server initialization
pub mod init;

pub use config::Stores;
pub use init::{build_app, create_app, App};
pub use state::AppState;
