//! Real-time Gateway Module
//!
//! Relays new messages, edits, typing indicators and audio-call signaling
//! between connected clients over WebSockets.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs         - Module exports and documentation
//! ├── connection.rs  - Per-connection state machine
//! ├── gateway.rs     - Routing table, fan-out, lifecycle
//! ├── delivery.rs    - Typed event router and publishers
//! └── socket.rs      - WebSocket upgrade and read/write loops
//! ```
//!
//! # Guarantees
//!
//! - Messages are stored before they are fanned out
//! - Events from one connection are processed in arrival order
//! - Delivery is best-effort and at-most-once; offline users catch up over HTTP

/// Connection state machine
pub mod connection;

/// Typed router and fan-out helpers
pub mod delivery;

/// Routing table and lifecycle
pub mod gateway;

/// WebSocket transport
pub mod socket;

pub use connection::{Connection, ConnectionId, ConnectionState};
pub use delivery::{Dispatcher, Origin};
pub use gateway::{Gateway, GatewayError, GatewaySettings};
pub use socket::ws_handler;
