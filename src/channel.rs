//! The handoff boundary to the external authorization agent.
//!
//! The orchestrator depends on one capability: dispatch a structured
//! authorization request and eventually receive exactly one structured
//! reply, or a channel-level failure. Any concrete transport (OS IPC,
//! loopback HTTP, deep link) implements [`AuthorizationChannel`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// The request handed off to the authorization agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub scope: Vec<String>,
    pub state: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

/// Status delivered by the agent with its reply.
///
/// Wire values follow the agent's integer codes: 0 success, -2 user
/// cancel, -4 denied, -5 unsupported; anything else is a generic failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    UserCancelled,
    Denied,
    Unsupported,
    Failed,
}

impl ReplyStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            -2 => Self::UserCancelled,
            -4 => Self::Denied,
            -5 => Self::Unsupported,
            _ => Self::Failed,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::UserCancelled => -2,
            Self::Denied => -4,
            Self::Unsupported => -5,
            Self::Failed => -1,
        }
    }
}

/// The single asynchronous reply for one authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizationReply {
    pub status: ReplyStatus,
    /// Authorization code; present iff `status` is [`ReplyStatus::Ok`].
    pub code: Option<String>,
    /// Echo of the request's state token.
    pub state: Option<String>,
    /// Agent-supplied human-readable error text.
    pub error: Option<String>,
}

impl AuthorizationReply {
    pub fn is_successful(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}

/// Transport capability the orchestrator depends on.
#[async_trait]
pub trait AuthorizationChannel: Send + Sync {
    /// Whether the agent is installed and exposes the expected
    /// authorization surface.
    async fn is_available(&self) -> bool;

    /// Dispatch `request` and wait for its single reply.
    ///
    /// Errors represent channel-level failures (agent uninstalled between
    /// check and dispatch, dispatch failure), not user decisions — those
    /// arrive as a reply with the corresponding status.
    async fn authorize(&self, request: AuthorizationRequest)
        -> Result<AuthorizationReply, AuthError>;
}
