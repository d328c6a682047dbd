//! Backend Module
//!
//! All server-side code: the Axum HTTP API, the realtime gateway and the
//! persistence layer. Only compiled with the `ssr` feature.
//!
//! # Architecture
//!
//! - **`server`** - Service wiring, application state, store selection
//! - **`routes`** - Route table and middleware layering
//! - **`auth`** - Identity provider, JWT tokens, user handlers
//! - **`messaging`** - Conversations and the message service
//! - **`realtime`** - WebSocket gateway, connection state, fan-out
//! - **`media`** - Upload handler and local media store
//! - **`store`** - Store traits with Postgres and in-memory implementations
//! - **`middleware`** - Bearer token middleware and extractors
//! - **`error`** - `BackendError` and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Initialization and state
//! ├── routes/         - Route configuration
//! ├── auth/           - Authentication
//! ├── messaging/      - Conversations and messages
//! ├── realtime/       - Gateway
//! ├── media/          - Media uploads
//! ├── store/          - Persistence
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Request Flow
//!
//! 1. HTTP request → `TraceLayer` → auth middleware (protected routes)
//! 2. Handler → service → store
//! 3. Writes that other users must see are handed to the `Dispatcher`,
//!    which pushes events to their live gateway connections

pub mod auth;
pub mod error;
pub mod media;
pub mod messaging;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod store;

pub use error::{BackendError, BackendResult};
pub use server::{create_app, AppState};
