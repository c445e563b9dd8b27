//! Password-proof authentication.
//!
//! The connecting streamer never sends the shared password. It generates a
//! random salt and nonce, then presents
//!
//! ```text
//! proof = b64(sha256(b64(sha256(password || salt)) || nonce))
//! ```
//!
//! The assistant recomputes the proof from its own configured password and
//! compares. A mismatch closes the socket with the `unauthorized` reason;
//! the streamer observes that like any other transport loss and retries on
//! its normal reconnect cadence.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Credentials presented in the `hello` envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    /// Random per-connection salt (base64).
    pub salt: String,
    /// Random per-connection nonce (base64).
    pub nonce: String,
    /// The challenge proof (base64).
    pub proof: String,
}

impl Authentication {
    /// Generate fresh salt + nonce and compute the proof for `password`.
    #[must_use]
    pub fn generate(password: &str) -> Self {
        let salt = random_token();
        let nonce = random_token();
        let proof = challenge_proof(password, &salt, &nonce);
        Self { salt, nonce, proof }
    }

    /// Whether this proof matches `password`.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        challenge_proof(password, &self.salt, &self.nonce) == self.proof
    }
}

/// 16 random bytes, base64 encoded.
fn random_token() -> String {
    let bytes: [u8; 16] = rand::random();
    BASE64.encode(bytes)
}

/// First round: `b64(sha256(password || salt))`.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Full proof: `b64(sha256(hash || nonce))` over [`hash_password`].
#[must_use]
pub fn challenge_proof(password: &str, salt: &str, nonce: &str) -> String {
    let hash = hash_password(password, salt);
    let mut hasher = Sha256::new();
    hasher.update(hash.as_bytes());
    hasher.update(nonce.as_bytes());
    BASE64.encode(hasher.finalize())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
