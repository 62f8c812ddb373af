//! The authorization orchestrator: drives the login state machine and the
//! independent refresh / profile / logout operations.
//!
//! Login transitions: Idle → AttemptPending → ExchangingCode →
//! FetchingProfile → Completed | Failed | Cancelled, after which the
//! orchestrator is idle again. Exactly one `AuthAttempt` is outstanding
//! at a time; starting a new login supersedes the pending one, and the
//! superseded attempt's late reply is discarded without side effects.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{debug, warn};

use crate::channel::{AuthorizationChannel, AuthorizationReply, AuthorizationRequest, ReplyStatus};
use crate::error::AuthError;
use crate::gateway::{AuthGateway, ProfileResponse, TokenGrant};
use crate::pkce::AuthAttempt;
use crate::store::{TokenRecord, TokenStore};
use crate::types::{AuthorizedUser, LoginOutcome};

pub struct AuthOrchestrator {
    client_id: String,
    client_secret: String,
    channel: Arc<dyn AuthorizationChannel>,
    gateway: AuthGateway,
    store: Arc<dyn TokenStore>,
    handoff_timeout: Option<Duration>,
    /// State token of the pending attempt, if any.
    current_attempt: Mutex<Option<String>>,
}

impl AuthOrchestrator {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        channel: Arc<dyn AuthorizationChannel>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            channel,
            gateway: AuthGateway::new(),
            store,
            handoff_timeout: None,
            current_attempt: Mutex::new(None),
        }
    }

    pub fn with_gateway(mut self, gateway: AuthGateway) -> Self {
        self.gateway = gateway;
        self
    }

    /// Bound the wait for the agent's reply. `None` waits indefinitely.
    pub fn with_handoff_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handoff_timeout = timeout;
        self
    }

    /// Run one full login flow for `scopes`.
    ///
    /// Resolves exactly once: `Ok(Completed)` with the combined user
    /// object, `Ok(Cancelled)` when the user backed out, or an error.
    pub async fn login(&self, scopes: Vec<String>) -> Result<LoginOutcome, AuthError> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(AuthError::InvalidParams(
                "client id or client secret is empty".to_string(),
            ));
        }
        if !self.channel.is_available().await {
            return Err(AuthError::AgentUnavailable(
                "authorization agent is not installed or does not support authorization"
                    .to_string(),
            ));
        }

        let attempt = AuthAttempt::new(self.client_id.clone(), scopes);
        self.begin_attempt(&attempt.state);
        debug!(state = %attempt.state, "dispatching authorization request to agent");

        let request = AuthorizationRequest {
            client_id: attempt.client_id.clone(),
            scope: attempt.scopes.clone(),
            state: attempt.state.clone(),
            code_challenge: attempt.code_challenge.clone(),
            code_challenge_method: attempt.challenge_method.to_string(),
        };

        let reply = match self.handoff_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.channel.authorize(request)).await
            {
                Ok(result) => result,
                Err(_) => {
                    self.finish_attempt(&attempt.state);
                    return Err(AuthError::AuthorizationFailed(
                        "timed out waiting for the authorization agent".to_string(),
                    ));
                }
            },
            None => self.channel.authorize(request).await,
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                self.finish_attempt(&attempt.state);
                return Err(err);
            }
        };

        self.complete_login(attempt, reply).await
    }

    /// Validate the agent's reply and run exchange + profile retrieval.
    async fn complete_login(
        &self,
        attempt: AuthAttempt,
        reply: AuthorizationReply,
    ) -> Result<LoginOutcome, AuthError> {
        if !self.is_current(&attempt.state) {
            debug!("discarding reply for a superseded authorization attempt");
            return Err(AuthError::AuthorizationFailed(
                "authorization attempt superseded by a newer login".to_string(),
            ));
        }
        // The attempt is consumed from here on, whatever the outcome.
        self.finish_attempt(&attempt.state);

        match reply.status {
            ReplyStatus::Ok => {}
            ReplyStatus::UserCancelled => {
                debug!("user cancelled authorization");
                return Ok(LoginOutcome::Cancelled);
            }
            ReplyStatus::Denied => {
                return Err(AuthError::AuthorizationFailed(
                    "user denied authorization".to_string(),
                ));
            }
            ReplyStatus::Unsupported => {
                return Err(AuthError::Unsupported(
                    "agent does not support the requested operation".to_string(),
                ));
            }
            ReplyStatus::Failed => {
                return Err(AuthError::AuthorizationFailed(
                    reply
                        .error
                        .unwrap_or_else(|| "authorization failed".to_string()),
                ));
            }
        }

        let code = reply.code.unwrap_or_default();
        if code.is_empty() {
            return Err(AuthError::AuthorizationFailed(
                "no authorization code in agent reply".to_string(),
            ));
        }
        if !attempt.verify_state(&reply.state.unwrap_or_default()) {
            warn!("state verification failed; possible response injection");
            return Err(AuthError::AuthorizationFailed(
                "state verification failed".to_string(),
            ));
        }

        let grant = self
            .gateway
            .exchange_code(
                &code,
                &self.client_id,
                &self.client_secret,
                &attempt.code_verifier,
                None,
            )
            .await?;
        // Persist before the profile fetch: a profile-only failure must not
        // cost the user the freshly obtained tokens.
        let record = self.persist_grant(&grant)?;

        let profile = self.gateway.fetch_profile(&record.access_token).await?;
        self.store.cache_user_id(&profile.user_id)?;
        debug!(user_id = %profile.user_id, "login completed");
        Ok(LoginOutcome::Completed(assemble_user(profile, &record)))
    }

    /// Direct profile fetch with an externally supplied access token.
    pub async fn user_info(&self, access_token: &str) -> Result<AuthorizedUser, AuthError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidParams(
                "access token is empty".to_string(),
            ));
        }
        let profile = self.gateway.fetch_profile(access_token).await?;
        let refresh_token = self.store.load()?.and_then(|r| r.refresh_token);
        Ok(AuthorizedUser {
            user_id: profile.user_id,
            open_id: profile.open_id,
            union_id: profile.union_id,
            nickname: profile.nickname,
            avatar_url: profile.avatar,
            access_token: access_token.to_string(),
            refresh_token,
        })
    }

    /// Refresh the stored token pair, then fetch the profile with the new
    /// access token. A failure at either step leaves the previously stored
    /// record in place.
    pub async fn refresh(&self) -> Result<AuthorizedUser, AuthError> {
        let refresh_token = self
            .store
            .load()?
            .and_then(|r| r.refresh_token)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::TokenExpired)?;

        let grant = self
            .gateway
            .refresh_token(&refresh_token, &self.client_id, &self.client_secret)
            .await?;
        let record = self.persist_grant(&grant)?;

        let profile = self.gateway.fetch_profile(&record.access_token).await?;
        self.store.cache_user_id(&profile.user_id)?;
        debug!(user_id = %profile.user_id, "token refresh completed");
        Ok(assemble_user(profile, &record))
    }

    /// Clear all persisted session data. Idempotent; no network calls.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()
    }

    pub fn is_logged_in(&self) -> Result<bool, AuthError> {
        self.store.is_logged_in()
    }

    fn persist_grant(&self, grant: &TokenGrant) -> Result<TokenRecord, AuthError> {
        let record = TokenRecord {
            access_token: grant.access_token.clone(),
            refresh_token: grant.refresh_token.clone(),
            expires_at: Utc::now() + ChronoDuration::seconds(grant.expires_in),
            open_id: grant.open_id.clone(),
            user_id: None,
        };
        self.store.save(&record)?;
        Ok(record)
    }

    fn begin_attempt(&self, state: &str) {
        let mut current = self
            .current_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *current = Some(state.to_string());
    }

    fn is_current(&self, state: &str) -> bool {
        let current = self
            .current_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.as_deref() == Some(state)
    }

    /// Clear the pending slot, but only if it still belongs to `state`.
    fn finish_attempt(&self, state: &str) {
        let mut current = self
            .current_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if current.as_deref() == Some(state) {
            *current = None;
        }
    }
}

fn assemble_user(profile: ProfileResponse, record: &TokenRecord) -> AuthorizedUser {
    AuthorizedUser {
        user_id: profile.user_id,
        open_id: profile.open_id,
        union_id: profile.union_id,
        nickname: profile.nickname,
        avatar_url: profile.avatar,
        access_token: record.access_token.clone(),
        refresh_token: record.refresh_token.clone(),
    }
}
