//! Consumer-facing session facade.
//!
//! A `Session` is constructed once at startup with explicit dependencies
//! (channel, store) and passed by reference to whatever needs it; there is
//! no global singleton. All methods delegate to the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use crate::channel::AuthorizationChannel;
use crate::error::AuthError;
use crate::gateway::AuthGateway;
use crate::orchestrator::AuthOrchestrator;
use crate::store::TokenStore;
use crate::types::{scope, AuthorizedUser, LoginOutcome};

/// Application credentials and flow options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Upper bound on the wait for the agent's reply; `None` waits
    /// indefinitely.
    pub handoff_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            handoff_timeout: None,
        }
    }

    pub fn with_handoff_timeout(mut self, timeout: Duration) -> Self {
        self.handoff_timeout = Some(timeout);
        self
    }
}

/// Configured login session for one application.
pub struct Session {
    orchestrator: AuthOrchestrator,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Build a session from credentials and explicit collaborators.
    ///
    /// Fails with `InvalidParams` when either credential is blank.
    pub fn new(
        config: SessionConfig,
        channel: Arc<dyn AuthorizationChannel>,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, AuthError> {
        if config.client_id.trim().is_empty() || config.client_secret.trim().is_empty() {
            return Err(AuthError::InvalidParams(
                "client id and client secret must not be blank".to_string(),
            ));
        }
        let orchestrator = AuthOrchestrator::new(
            config.client_id,
            config.client_secret,
            channel,
            store.clone(),
        )
        .with_handoff_timeout(config.handoff_timeout);
        Ok(Self {
            orchestrator,
            store,
        })
    }

    /// Replace the default gateway, e.g. to target a different base URL.
    pub fn with_gateway(mut self, gateway: AuthGateway) -> Self {
        self.orchestrator = self.orchestrator.with_gateway(gateway);
        self
    }

    /// Start a login flow. `None` requests the default scopes.
    pub async fn login(&self, scopes: Option<&[&str]>) -> Result<LoginOutcome, AuthError> {
        let scopes = match scopes {
            Some(values) => values.iter().map(|s| s.to_string()).collect(),
            None => scope::default_scopes(),
        };
        self.orchestrator.login(scopes).await
    }

    /// Fetch the profile for an externally supplied access token.
    pub async fn user_info(&self, access_token: &str) -> Result<AuthorizedUser, AuthError> {
        self.orchestrator.user_info(access_token).await
    }

    /// Refresh the stored token pair and return the updated user.
    pub async fn refresh_token(&self) -> Result<AuthorizedUser, AuthError> {
        self.orchestrator.refresh().await
    }

    /// Clear all persisted session data.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.orchestrator.logout()
    }

    /// Local liveness check: a token is present and not expired.
    pub fn is_logged_in(&self) -> bool {
        self.store.is_logged_in().unwrap_or(false)
    }

    /// The cached access token, which may already be expired.
    pub fn cached_access_token(&self) -> Option<String> {
        self.store.cached_access_token().ok().flatten()
    }

    pub fn cached_user_id(&self) -> Option<String> {
        self.store.cached_user_id().ok().flatten()
    }

    pub fn cached_open_id(&self) -> Option<String> {
        self.store.cached_open_id().ok().flatten()
    }
}
