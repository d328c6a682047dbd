//! Chatline - Main Library
//!
//! Chatline is a one-to-one chat backend: an HTTP API for accounts,
//! conversations and messages, plus a WebSocket gateway that relays new
//! messages, typing indicators and audio-call signaling between connected
//! clients.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between server and clients
//!   - Users, conversations, messages, pages
//!   - Response envelope and realtime event frames
//!   - Configuration and error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum HTTP server and auth middleware
//!   - Identity provider (bcrypt + JWT)
//!   - Message and conversation services over a pluggable store
//!   - Realtime gateway
//!   - Local media store
//!
//! # Feature Flags
//!
//! - **`ssr`** - Server-side code (enabled by default)
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatline::backend::server::init::create_app;
//! use chatline::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let app = create_app(config).await?;
//! // Serve `app.router` with axum and call `app.state.gateway.shutdown()` on exit
//! # Ok(())
//! # }
//! ```
//!
//! # Delivery Model
//!
//! Messages are persisted before they are fanned out. Delivery to live
//! connections is best-effort and at-most-once; clients that were offline
//! catch up by reading history over HTTP.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
