//! HTTP gateway for the platform's OAuth endpoints.
//!
//! Three operations: code-for-token exchange, token refresh, profile
//! retrieval. The gateway performs no retries; retry policy belongs to
//! the caller.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AuthError;

const DEFAULT_BASE_URL: &str = "https://open.scarletapp.com";
const TOKEN_PATH: &str = "/oauth/token";
const USER_INFO_PATH: &str = "/oauth/userinfo";
const REFRESH_TOKEN_PATH: &str = "/oauth/refresh_token";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful response from the token and refresh endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in seconds, relative to issuance.
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub open_id: String,
    pub union_id: Option<String>,
}

/// Successful response from the profile endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub open_id: String,
    pub union_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub gender: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    #[serde(default)]
    error_code: i64,
}

/// Client for the platform's OAuth endpoints.
pub struct AuthGateway {
    client: reqwest::Client,
    token_url: String,
    user_info_url: String,
    refresh_token_url: String,
}

impl Default for AuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGateway {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            token_url: format!("{DEFAULT_BASE_URL}{TOKEN_PATH}"),
            user_info_url: format!("{DEFAULT_BASE_URL}{USER_INFO_PATH}"),
            refresh_token_url: format!("{DEFAULT_BASE_URL}{REFRESH_TOKEN_PATH}"),
        }
    }

    /// Point all three endpoints at a different base URL.
    pub fn with_base_url(mut self, base: impl AsRef<str>) -> Self {
        let base = base.as_ref().trim_end_matches('/').to_string();
        self.token_url = format!("{base}{TOKEN_PATH}");
        self.user_info_url = format!("{base}{USER_INFO_PATH}");
        self.refresh_token_url = format!("{base}{REFRESH_TOKEN_PATH}");
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_user_info_url(mut self, url: impl Into<String>) -> Self {
        self.user_info_url = url.into();
        self
    }

    pub fn with_refresh_token_url(mut self, url: impl Into<String>) -> Self {
        self.refresh_token_url = url.into();
        self
    }

    /// Exchange an authorization code for tokens.
    ///
    /// `redirect_uri` is included only when present; it is absent in an
    /// app-to-app handoff.
    pub async fn exchange_code(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
        code_verifier: &str,
        redirect_uri: Option<&str>,
    ) -> Result<TokenGrant, AuthError> {
        debug!(endpoint = %self.token_url, "exchanging authorization code for tokens");
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code_verifier", code_verifier),
        ];
        if let Some(uri) = redirect_uri.filter(|u| !u.is_empty()) {
            form.push(("redirect_uri", uri));
        }
        let resp = self.client.post(&self.token_url).form(&form).send().await?;
        decode_response(resp).await
    }

    /// Obtain a new token pair from a refresh token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenGrant, AuthError> {
        debug!(endpoint = %self.refresh_token_url, "refreshing access token");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        let resp = self
            .client
            .post(&self.refresh_token_url)
            .form(&form)
            .send()
            .await?;
        decode_response(resp).await
    }

    /// Fetch the user profile for `access_token`.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<ProfileResponse, AuthError> {
        debug!(endpoint = %self.user_info_url, "fetching user profile");
        let resp = self
            .client
            .get(&self.user_info_url)
            .header("Authorization", format!("Bearer {access_token}"))
            .send()
            .await?;
        decode_response(resp).await
    }
}

async fn decode_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, AuthError> {
    let status = resp.status();
    let body = resp.text().await?;

    if status.is_success() {
        if body.is_empty() {
            return Err(AuthError::Unknown("empty response body".to_string()));
        }
        return serde_json::from_str(&body)
            .map_err(|e| AuthError::Unknown(format!("failed to decode response: {e}")));
    }

    warn!(status = %status, "gateway request failed");
    Err(parse_error_body(&body, status))
}

fn parse_error_body(body: &str, status: StatusCode) -> AuthError {
    if !body.is_empty() {
        if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
            return AuthError::Api {
                status: status.as_u16(),
                code: err.error_code,
                message: err.error.unwrap_or_else(|| "unknown error".to_string()),
                description: err.error_description,
            };
        }
    }
    // Undecodable error body degrades to a transport-level error.
    AuthError::Network(format!("request failed with HTTP status {status}"))
}
