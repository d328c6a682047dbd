/**
 * Application State Management
 *
 * `AppState` is the central state container shared by every handler. The
 * `FromRef` implementations let handlers extract just the service they
 * need (`State<MessageService>`, `State<IdentityProvider>`, ...) instead of
 * the whole struct.
 *
 * All services are cheap to clone: they hold `Arc`s to the store and the
 * gateway.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::IdentityProvider;
use crate::backend::media::MediaStore;
use crate::backend::messaging::{ConversationService, MessageService};
use crate::backend::realtime::{Dispatcher, Gateway};
use crate::shared::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Registration, login and token resolution
    pub identity: IdentityProvider,
    pub conversations: ConversationService,
    pub messages: MessageService,
    /// Live connection routing table
    ///
    /// Owned here so the binary can shut it down on exit.
    pub gateway: Arc<Gateway>,
    /// Router for socket events and HTTP fan-out
    pub dispatcher: Dispatcher,
    pub media: Arc<dyn MediaStore>,
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for IdentityProvider {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for ConversationService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.conversations.clone()
    }
}

impl FromRef<AppState> for MessageService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.messages.clone()
    }
}

impl FromRef<AppState> for Arc<Gateway> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gateway.clone()
    }
}

impl FromRef<AppState> for Dispatcher {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dispatcher.clone()
    }
}

impl FromRef<AppState> for Arc<dyn MediaStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.media.clone()
    }
}
