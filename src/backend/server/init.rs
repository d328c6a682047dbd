/**
 * Server Initialization
 *
 * Wires the store, services, gateway and router together.
 *
 * # Initialization Process
 *
 * 1. Open the store (Postgres or in-memory)
 * 2. Build the identity provider and messaging services
 * 3. Start the gateway and its dispatcher
 * 4. Create the media store
 * 5. Assemble the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::auth::{IdentityProvider, TokenService};
use crate::backend::error::BackendResult;
use crate::backend::media::LocalMediaStore;
use crate::backend::messaging::{ConversationService, MessageService};
use crate::backend::realtime::{Dispatcher, Gateway, GatewaySettings};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_stores, Stores};
use crate::backend::server::state::AppState;
use crate::shared::AppConfig;

/// A ready-to-serve application
pub struct App {
    pub router: Router<()>,
    /// Kept so the caller can shut the gateway down
    pub state: AppState,
}

/// Create the application from configuration, opening the configured store
pub async fn create_app(config: AppConfig) -> BackendResult<App> {
    tracing::info!("Initializing chatline server");

    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret. Do not run this in production.");
    }

    let stores = load_stores(&config).await?;
    Ok(build_app(config, stores))
}

/// Assemble the application over existing stores
pub fn build_app(config: AppConfig, stores: Stores) -> App {
    let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_secs)
        .with_refresh_ttl(config.refresh_token_ttl_secs);
    let identity = IdentityProvider::new(stores.users.clone(), tokens, config.bcrypt_cost);
    let conversations = ConversationService::new(stores.chats.clone(), stores.users.clone());
    let messages = MessageService::new(stores.chats.clone(), config.page_size, config.history_cap);

    let gateway = Arc::new(Gateway::new(GatewaySettings::from_config(&config)));
    let dispatcher = Dispatcher::new(gateway.clone(), messages.clone());
    let media = Arc::new(LocalMediaStore::new(config.media_dir.clone()));

    let state = AppState {
        config: Arc::new(config),
        identity,
        conversations,
        messages,
        gateway,
        dispatcher,
        media,
    };

    let router = create_router(state.clone());
    tracing::info!("Router configured");

    App { router, state }
}
