//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients: the messaging data model, the response
//! envelope, the realtime event frames and the configuration.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for serialization
//! as JSON over HTTP and WebSocket.

/// Application configuration
pub mod config;

/// Uniform response envelope
pub mod envelope;

/// Shared error types
pub mod error;

/// Realtime socket frames
pub mod event;

/// Users, conversations and messages
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use envelope::{ApiResponse, ErrorBody};
pub use error::SharedError;
pub use event::{ClientEvent, ServerEvent};
