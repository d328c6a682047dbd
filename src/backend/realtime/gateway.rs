/**
 * Realtime Gateway
 *
 * The gateway owns the routing table of live connections:
 *
 * ```text
 * user id -> { connection id -> bounded event queue }
 * ```
 *
 * The table is a `DashMap`, so registrations and removals for one identity
 * are serialized by that identity's entry lock while sends to other
 * identities proceed concurrently. Each queue is drained by the socket's
 * writer task.
 *
 * # Delivery
 *
 * Delivery is best-effort and at-most-once. Sends use `try_send`: a full or
 * closed queue drops the event with a warning and the sender is never told.
 * An identity with no active connection simply receives nothing.
 *
 * # Lifecycle
 *
 * The gateway is created at startup and held in `AppState`. `shutdown()`
 * refuses new registrations and drops every queue, which ends all writer
 * tasks and closes their sockets. `disconnect_user()` does the same for
 * one identity after a logout or password change.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::backend::realtime::connection::{Connection, ConnectionId, TransitionError};
use crate::shared::config::AppConfig;
use crate::shared::event::{ServerEvent, Welcome};

/// A sender for events to one connection
pub type EventSender = mpsc::Sender<ServerEvent>;

/// Tunables copied from `AppConfig`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewaySettings {
    pub connection_buffer: usize,
    pub ping_interval: Duration,
    pub typing_timeout_ms: u64,
}

impl GatewaySettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            connection_buffer: config.connection_buffer.max(1),
            ping_interval: Duration::from_secs(config.ping_interval_secs.max(1)),
            typing_timeout_ms: config.typing_timeout_ms,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway is shut down")]
    Closed,
    #[error("connection is not authenticated")]
    NotAuthenticated,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub struct Gateway {
    routes: DashMap<Uuid, HashMap<ConnectionId, EventSender>>,
    next_connection_id: AtomicU64,
    open: AtomicBool,
    settings: GatewaySettings,
}

impl Gateway {
    pub fn new(settings: GatewaySettings) -> Self {
        tracing::info!(
            "[Gateway] Started (buffer {}, ping every {:?})",
            settings.connection_buffer,
            settings.ping_interval
        );
        Self {
            routes: DashMap::new(),
            next_connection_id: AtomicU64::new(1),
            open: AtomicBool::new(true),
            settings,
        }
    }

    pub fn settings(&self) -> GatewaySettings {
        self.settings
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Allocate a connection in the `Connecting` state
    pub fn open_connection(&self) -> Result<Connection, GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::Closed);
        }
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        Ok(Connection::new(id))
    }

    /// Make an authenticated connection `Active` and return its event queue
    ///
    /// The queue starts with a `connected` event.
    pub fn register(&self, connection: &mut Connection) -> Result<mpsc::Receiver<ServerEvent>, GatewayError> {
        if !self.is_open() {
            connection.disconnect();
            return Err(GatewayError::Closed);
        }
        let Some(user_id) = connection.user_id() else {
            connection.disconnect();
            return Err(GatewayError::NotAuthenticated);
        };
        connection.activate()?;

        let (tx, rx) = mpsc::channel(self.settings.connection_buffer);
        let welcome = ServerEvent::Connected(Welcome {
            user_id,
            connection_id: connection.id(),
            typing_timeout_ms: self.settings.typing_timeout_ms,
            ping_interval_secs: self.settings.ping_interval.as_secs(),
        });
        // Fresh queue with capacity >= 1, cannot be full
        let _ = tx.try_send(welcome);

        self.routes.entry(user_id).or_default().insert(connection.id(), tx);

        // A shutdown that raced with the insert may have missed this entry
        if !self.is_open() {
            self.remove(user_id, connection.id());
            connection.disconnect();
            return Err(GatewayError::Closed);
        }

        tracing::info!("[Gateway] Connection {} active for user {}", connection.id(), user_id);
        Ok(rx)
    }

    /// Remove a connection; the identity goes offline with its last one
    pub fn unregister(&self, connection: &mut Connection) {
        if let Some(user_id) = connection.user_id() {
            if self.remove(user_id, connection.id()) {
                tracing::info!("[Gateway] Connection {} closed for user {}", connection.id(), user_id);
            }
        }
        connection.disconnect();
    }

    fn remove(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        let removed = match self.routes.get_mut(&user_id) {
            Some(mut connections) => connections.remove(&connection_id).is_some(),
            None => false,
        };
        self.routes.remove_if(&user_id, |_, connections| connections.is_empty());
        removed
    }

    /// Drop every queue of `user_id`, closing all of its sockets
    ///
    /// Used when the identity's credentials are revoked. Returns how many
    /// connections were released.
    pub fn disconnect_user(&self, user_id: Uuid) -> usize {
        match self.routes.remove(&user_id) {
            Some((_, connections)) => {
                tracing::info!("[Gateway] Released {} connections of user {}", connections.len(), user_id);
                connections.len()
            }
            None => 0,
        }
    }

    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.routes.contains_key(&user_id)
    }

    pub fn connection_count(&self, user_id: Uuid) -> usize {
        self.routes.get(&user_id).map_or(0, |c| c.len())
    }

    /// Number of identities with at least one active connection
    pub fn online_users(&self) -> usize {
        self.routes.len()
    }

    /// Enqueue an event on every active connection of `user_id`
    ///
    /// Returns how many queues accepted it.
    pub fn send_to_user(&self, user_id: Uuid, event: &ServerEvent) -> usize {
        self.send_filtered(user_id, event, |_| true)
    }

    /// Enqueue an event on one connection
    pub fn send_to_connection(&self, user_id: Uuid, connection_id: ConnectionId, event: &ServerEvent) -> bool {
        self.send_filtered(user_id, event, |id| id == connection_id) == 1
    }

    fn send_filtered<F>(&self, user_id: Uuid, event: &ServerEvent, include: F) -> usize
    where
        F: Fn(ConnectionId) -> bool,
    {
        let Some(connections) = self.routes.get(&user_id) else {
            tracing::debug!("[Gateway] {} dropped, user {} offline", event.name(), user_id);
            return 0;
        };

        let mut delivered = 0;
        for (&connection_id, tx) in connections.iter().filter(|(id, _)| include(**id)) {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        "[Gateway] Queue full, dropped {} for connection {} of user {}",
                        event.name(),
                        connection_id,
                        user_id
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!("[Gateway] Connection {} of user {} already closed", connection_id, user_id);
                }
            }
        }
        delivered
    }

    /// Refuse new connections and drop every queue
    pub fn shutdown(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let users = self.routes.len();
            self.routes.clear();
            tracing::info!("[Gateway] Shut down, released {} online users", users);
        }
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new(GatewaySettings::default())
    }
}
