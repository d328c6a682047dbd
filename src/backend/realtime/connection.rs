//! Live connection state
//!
//! A socket moves through `Connecting -> Authenticated -> Active ->
//! Disconnected`. Any state may go to `Disconnected`; every other jump is
//! rejected. Only `Active` connections receive events.

use thiserror::Error;
use uuid::Uuid;

/// Gateway-assigned connection identifier, unique for the process lifetime
pub type ConnectionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Authenticated,
    Active,
    Disconnected,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Connecting, Authenticated) | (Authenticated, Active) => true,
            (Disconnected, Disconnected) => false,
            (_, Disconnected) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid connection transition from {from:?} to {to:?}")]
pub struct TransitionError {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    user_id: Option<Uuid>,
    state: ConnectionState,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            user_id: None,
            state: ConnectionState::Connecting,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The authenticated identity, once known
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    fn transition(&mut self, to: ConnectionState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(to) {
            return Err(TransitionError { from: self.state, to });
        }
        self.state = to;
        Ok(())
    }

    /// Bind the connection to a verified identity
    pub fn authenticate(&mut self, user_id: Uuid) -> Result<(), TransitionError> {
        self.transition(ConnectionState::Authenticated)?;
        self.user_id = Some(user_id);
        Ok(())
    }

    pub(crate) fn activate(&mut self) -> Result<(), TransitionError> {
        self.transition(ConnectionState::Active)
    }

    /// Idempotent
    pub fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}
