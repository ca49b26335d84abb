//! Proof Key for Code Exchange primitives.
//!
//! The verifier is the secret half that never leaves the client until the token exchange. The
//! challenge is what the provider sees during the authorization redirect.
use base64::Engine;
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use sha2::{Digest, Sha256};

/// Length of the verifier generated for every login attempt. Must stay within `43..=128`.
pub const VERIFIER_LENGTH: usize = 64;

/// Random string of exactly `length` ascii alphanumeric characters.
///
/// Characters come from the operating system's cryptographically secure generator.
pub fn random_string(length: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn sha256<S: AsRef<[u8]>>(value: S) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value);
    hasher.finalize().to_vec()
}

fn base64encode<S: AsRef<[u8]>>(value: S) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value)
}

/// S256 code challenge for `verifier`: base64url (no padding) of its sha256 digest.
pub fn challenge<S: AsRef<str>>(verifier: S) -> String {
    base64encode(sha256(verifier.as_ref().as_bytes()))
}
