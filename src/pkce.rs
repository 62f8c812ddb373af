//! PKCE parameter generation for a single authorization attempt (RFC 7636).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const CHALLENGE_METHOD: &str = "S256";
const CODE_VERIFIER_LENGTH: usize = 128;
/// RFC 7636 "unreserved characters".
const CODE_VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE and anti-CSRF parameters for one in-flight authorization attempt.
///
/// Created when a login starts and consumed exactly once: either by a
/// successful code exchange or by any terminal failure. Never reused.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    pub client_id: String,
    pub scopes: Vec<String>,
    /// Anti-CSRF token, echoed back by the authorization agent.
    pub state: String,
    /// The secret presented at token exchange to prove possession.
    pub code_verifier: String,
    /// `base64url_nopad(SHA256(code_verifier))`, sent with the request.
    pub code_challenge: String,
    pub challenge_method: &'static str,
}

impl AuthAttempt {
    /// Generate fresh PKCE parameters for `client_id` and `scopes`.
    ///
    /// The verifier and state are independent draws from the OS CSPRNG; no
    /// I/O is performed.
    pub fn new(client_id: impl Into<String>, scopes: Vec<String>) -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = derive_code_challenge(&code_verifier);
        Self {
            client_id: client_id.into(),
            scopes,
            state: generate_state(),
            code_verifier,
            code_challenge,
            challenge_method: CHALLENGE_METHOD,
        }
    }

    /// Compare a received state value against this attempt's state.
    ///
    /// Constant-behavior comparison; does not short-circuit on length.
    pub fn verify_state(&self, received: &str) -> bool {
        constant_time_eq(self.state.as_bytes(), received.as_bytes())
    }
}

fn generate_code_verifier() -> String {
    let mut rng = OsRng;
    (0..CODE_VERIFIER_LENGTH)
        .map(|_| CODE_VERIFIER_CHARSET[rng.gen_range(0..CODE_VERIFIER_CHARSET.len())] as char)
        .collect()
}

fn derive_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn generate_state() -> String {
    Uuid::new_v4().simple().to_string()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= (x ^ y) as usize;
    }
    diff == 0
}
