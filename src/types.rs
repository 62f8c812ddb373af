//! Domain types shared across the login flow.

use serde::{Deserialize, Serialize};

/// Permission scopes recognized by the Scarlet open platform.
pub mod scope {
    /// Basic public profile information.
    pub const BASIC_INFO: &str = "basic_info";
    /// Extended profile details.
    pub const USER_PROFILE: &str = "user_profile";
    /// Read the user's published notes.
    pub const READ_NOTES: &str = "read_notes";
    /// Publish or modify notes on the user's behalf.
    pub const WRITE_NOTES: &str = "write_notes";
    /// Read the user's follower list.
    pub const READ_FOLLOWERS: &str = "read_followers";

    /// Scopes requested when the caller passes none.
    pub fn default_scopes() -> Vec<String> {
        vec![BASIC_INFO.to_string(), USER_PROFILE.to_string()]
    }
}

/// The user object delivered to the caller after a completed login,
/// combining profile fields with the tokens current at retrieval time.
///
/// The tokens here are a convenience copy; the token store remains the
/// authoritative source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub user_id: String,
    pub open_id: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Terminal outcome of a login flow.
///
/// Cancellation is not an error: the user changed their mind and nothing
/// went wrong. Genuine failures are reported as [`crate::AuthError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The full flow succeeded; tokens are persisted and the profile fetched.
    Completed(AuthorizedUser),
    /// The user cancelled the authorization in the external agent.
    Cancelled,
}
