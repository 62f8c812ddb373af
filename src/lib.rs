//! Scarlet Login SDK
//!
//! Client side of an OAuth 2.0 authorization-code flow with PKCE against
//! the Scarlet platform's external authorization agent. Covers the full
//! token lifecycle: issuance, encrypted caching, expiry checks, refresh
//! and revocation.
//!
//! The entry point is [`session::Session`], constructed once with an
//! [`channel::AuthorizationChannel`] transport and a
//! [`store::TokenStore`]. `login` drives the handoff, validates the
//! agent's reply (state echo, code presence), exchanges the code through
//! the [`gateway::AuthGateway`], persists tokens encrypted at rest, and
//! resolves with a typed success / error / cancellation outcome.

pub mod channel;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod pkce;
pub mod session;
pub mod store;
pub mod types;

pub use channel::{AuthorizationChannel, AuthorizationReply, AuthorizationRequest, ReplyStatus};
pub use error::AuthError;
pub use gateway::AuthGateway;
pub use orchestrator::AuthOrchestrator;
pub use pkce::AuthAttempt;
pub use session::{Session, SessionConfig};
pub use store::{FileTokenStore, TokenRecord, TokenStore, TokenStoreConfig};
pub use types::{scope, AuthorizedUser, LoginOutcome};
