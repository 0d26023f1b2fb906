//! Password hashing and session tokens.
//!
//! The engine only talks to [`CredentialHasher`]; the default implementation
//! is [`SaltedSha256`], an iterated SHA-256 over a random per-user salt.
//! Stored credentials are self-describing:
//!
//! ```text
//! sha256$<rounds>$<salt, base64>$<digest, base64>
//! ```

use std::fmt;

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

use crate::{EngineError, ResultEngine};

const SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Hashes and verifies user passwords.
pub trait CredentialHasher: Send + Sync + fmt::Debug {
    /// Produce the opaque stored form of `password`.
    fn hash(&self, password: &str) -> ResultEngine<String>;

    /// Check `password` against a value produced by [`CredentialHasher::hash`].
    fn verify(&self, stored: &str, password: &str) -> ResultEngine<bool>;
}

#[derive(Clone, Copy, Debug)]
pub struct SaltedSha256 {
    rounds: u32,
}

impl Default for SaltedSha256 {
    fn default() -> Self {
        Self { rounds: 10_000 }
    }
}

impl SaltedSha256 {
    /// Use a custom iteration count. Tests use a low one to stay fast.
    #[must_use]
    pub fn with_rounds(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    fn digest(salt: &[u8], password: &[u8], rounds: u32) -> Vec<u8> {
        let mut out = Sha256::new()
            .chain_update(salt)
            .chain_update(password)
            .finalize();
        for _ in 1..rounds {
            out = Sha256::new()
                .chain_update(out)
                .chain_update(salt)
                .chain_update(password)
                .finalize();
        }
        out.to_vec()
    }
}

impl CredentialHasher for SaltedSha256 {
    fn hash(&self, password: &str) -> ResultEngine<String> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|err| EngineError::Credential(format!("salt generation failed: {err}")))?;
        let digest = Self::digest(&salt, password.as_bytes(), self.rounds);
        Ok(format!(
            "{SCHEME}${}${}${}",
            self.rounds,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(digest)
        ))
    }

    fn verify(&self, stored: &str, password: &str) -> ResultEngine<bool> {
        let malformed = || EngineError::Credential("malformed stored credential".to_string());

        let mut parts = stored.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(malformed());
        };
        let rounds: u32 = rounds.parse().map_err(|_| malformed())?;
        let salt = STANDARD_NO_PAD.decode(salt).map_err(|_| malformed())?;
        let expected = STANDARD_NO_PAD.decode(expected).map_err(|_| malformed())?;

        let actual = Self::digest(&salt, password.as_bytes(), rounds.max(1));
        Ok(constant_time_eq(&actual, &expected))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// A bearer token returned by `login`.
///
/// `Debug` is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Generate a fresh random token.
pub(crate) fn generate_token() -> ResultEngine<SessionToken> {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| EngineError::Credential(format!("token generation failed: {err}")))?;
    Ok(SessionToken(URL_SAFE_NO_PAD.encode(bytes)))
}

/// Storage key for a token.
pub(crate) fn token_digest(token: &str) -> String {
    STANDARD_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = SaltedSha256::with_rounds(8);
        let stored = hasher.hash("hunter2").unwrap();

        assert!(stored.starts_with("sha256$8$"));
        assert!(hasher.verify(&stored, "hunter2").unwrap());
        assert!(!hasher.verify(&stored, "hunter3").unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let hasher = SaltedSha256::with_rounds(2);
        let a = hasher.hash("secret").unwrap();
        let b = hasher.hash("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_uses_stored_rounds() {
        let stored = SaltedSha256::with_rounds(3).hash("pw").unwrap();
        assert!(SaltedSha256::default().verify(&stored, "pw").unwrap());
    }

    #[test]
    fn malformed_credentials_are_rejected() {
        let hasher = SaltedSha256::default();
        for stored in ["", "plain", "md5$1$aa$bb", "sha256$x$aa$bb", "sha256$1$!!$bb"] {
            assert!(matches!(
                hasher.verify(stored, "pw"),
                Err(EngineError::Credential(_))
            ));
        }
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(format!("{a:?}"), "SessionToken(..)");
    }

    #[test]
    fn token_digest_is_stable() {
        assert_eq!(token_digest("abc"), token_digest("abc"));
        assert_ne!(token_digest("abc"), token_digest("abd"));
    }
}
