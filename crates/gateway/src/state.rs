//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::{CommerceClient, CommerceError};
use crate::config::GatewayConfig;
use crate::services::identity::IdentityBridge;
use crate::services::order_return::OrderReturnTranslator;
use crate::services::session_token::SessionTokenIssuer;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds no per-session data: everything a
/// session needs travels in its token.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    identity: IdentityBridge<CommerceClient>,
    tokens: SessionTokenIssuer,
    orders: OrderReturnTranslator,
}

impl AppState {
    /// Wire the services from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the commerce client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, CommerceError> {
        let identity = IdentityBridge::new(
            CommerceClient::new(&config.commerce)?,
            config.credential_secret.clone(),
        );
        let tokens = SessionTokenIssuer::new(config.token_secret.clone(), config.login_url.clone());
        let orders = OrderReturnTranslator::new(config.documents.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                tokens,
                orders,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityBridge<CommerceClient> {
        &self.inner.identity
    }

    #[must_use]
    pub fn tokens(&self) -> &SessionTokenIssuer {
        &self.inner.tokens
    }

    #[must_use]
    pub fn orders(&self) -> &OrderReturnTranslator {
        &self.inner.orders
    }
}
