#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use scarlet_auth::channel::{
    AuthorizationChannel, AuthorizationReply, AuthorizationRequest, ReplyStatus,
};
use scarlet_auth::error::AuthError;
use scarlet_auth::store::{TokenRecord, TokenStore};

#[derive(Default)]
pub struct InMemoryTokenStore {
    record: Mutex<Option<TokenRecord>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, record: TokenRecord) {
        *self.record.lock().expect("store lock poisoned") = Some(record);
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<TokenRecord>, AuthError> {
        Ok(self.record.lock().expect("store lock poisoned").clone())
    }

    fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        *self.record.lock().expect("store lock poisoned") = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.record.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// What the scripted channel should do with the next request.
pub enum ScriptedReply {
    /// Success with the given code, echoing the request's state.
    Success { code: String },
    /// Success with a fixed (possibly mismatching) state echo.
    SuccessWithState { code: String, state: String },
    /// Any non-success status with optional agent error text.
    Status {
        status: ReplyStatus,
        error: Option<String>,
    },
    /// Delay, then success echoing the request's state.
    DelayedSuccess { code: String, delay: Duration },
    /// Channel-level failure.
    ChannelError(String),
    /// Never reply (for timeout tests).
    Hang,
}

/// Test double for the external authorization agent.
pub struct ScriptedChannel {
    available: bool,
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<AuthorizationRequest>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self {
            available: true,
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn script(self, reply: ScriptedReply) -> Self {
        self.replies
            .lock()
            .expect("channel lock poisoned")
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<AuthorizationRequest> {
        self.requests.lock().expect("channel lock poisoned").clone()
    }
}

#[async_trait]
impl AuthorizationChannel for ScriptedChannel {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn authorize(
        &self,
        request: AuthorizationRequest,
    ) -> Result<AuthorizationReply, AuthError> {
        let state = request.state.clone();
        self.requests
            .lock()
            .expect("channel lock poisoned")
            .push(request);
        let scripted = self
            .replies
            .lock()
            .expect("channel lock poisoned")
            .pop_front()
            .expect("no scripted reply left");
        match scripted {
            ScriptedReply::Success { code } => Ok(AuthorizationReply {
                status: ReplyStatus::Ok,
                code: Some(code),
                state: Some(state),
                error: None,
            }),
            ScriptedReply::SuccessWithState { code, state } => Ok(AuthorizationReply {
                status: ReplyStatus::Ok,
                code: Some(code),
                state: Some(state),
                error: None,
            }),
            ScriptedReply::Status { status, error } => Ok(AuthorizationReply {
                status,
                code: None,
                state: None,
                error,
            }),
            ScriptedReply::DelayedSuccess { code, delay } => {
                tokio::time::sleep(delay).await;
                Ok(AuthorizationReply {
                    status: ReplyStatus::Ok,
                    code: Some(code),
                    state: Some(state),
                    error: None,
                })
            }
            ScriptedReply::ChannelError(message) => Err(AuthError::AgentUnavailable(message)),
            ScriptedReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AuthError::Unknown("hang elapsed".to_string()))
            }
        }
    }
}

pub fn record_with_refresh(refresh_token: Option<&str>) -> TokenRecord {
    TokenRecord {
        access_token: "stored-access".to_string(),
        refresh_token: refresh_token.map(String::from),
        expires_at: Utc::now() + ChronoDuration::hours(1),
        open_id: "stored-open-id".to_string(),
        user_id: Some("stored-user-id".to_string()),
    }
}
