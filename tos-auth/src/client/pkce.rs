use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, TryRngCore};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

/// PKCE verifier and its S256 challenge. Lives only for one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub const METHOD: &'static str = "S256";

    /// Draws a fresh verifier from the OS random source.
    pub fn generate() -> Result<Self, AuthError> {
        let bytes = random_bytes::<VERIFIER_BYTES>()?;
        Ok(Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes)))
    }

    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(digest);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Random nonce for the `state` parameter of one authorization request.
pub fn generate_state() -> Result<String, AuthError> {
    let bytes = random_bytes::<STATE_BYTES>()?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn random_bytes<const N: usize>() -> Result<[u8; N], AuthError> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn matches_rfc7636_example() {
        let pair = PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(pair.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn generated_pairs_are_well_formed() {
        for _ in 0..64 {
            let pair = PkceChallenge::generate().unwrap();
            assert!((43..=128).contains(&pair.verifier.len()));
            assert!(is_url_safe(&pair.verifier));
            assert!(is_url_safe(&pair.challenge));
            assert!(!pair.challenge.ends_with('='));

            let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(pair.verifier.as_bytes()));
            assert_eq!(pair.challenge, expected);
        }
    }

    #[test]
    fn verifiers_differ_between_attempts() {
        let a = PkceChallenge::generate().unwrap();
        let b = PkceChallenge::generate().unwrap();
        assert_ne!(a.verifier, b.verifier);
    }

    #[test]
    fn state_is_fresh_and_url_safe() {
        let a = generate_state().unwrap();
        let b = generate_state().unwrap();
        assert_ne!(a, b);
        assert!(is_url_safe(&a));
    }
}
