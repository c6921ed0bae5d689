//! Ed25519 signing key pair

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use sealkit_core::{SealError, SealResult};

/// An Ed25519 key pair for producing detached signatures.
///
/// The secret half zeroizes itself on drop (`ed25519_dalek::SigningKey`
/// implements `ZeroizeOnDrop`); it must only be persisted through the
/// private-key vault.
pub struct SigningKeyPair {
    signing: SigningKey,
}

impl SigningKeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a key pair from the raw 32-byte secret (e.g. recovered from
    /// the vault).
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(bytes),
        }
    }

    /// The raw secret, for handing to the vault. Zeroized on drop.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing.to_bytes())
    }

    /// The public half, safe to distribute.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing.verifying_key()
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Signature {
        self.signing.sign(message)
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("secret", &"[REDACTED]")
            .field("public", &self.verifying_key())
            .finish()
    }
}

/// Parse a 32-byte Ed25519 public key.
pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> SealResult<VerifyingKey> {
    VerifyingKey::from_bytes(bytes)
        .map_err(|_| SealError::Validation("invalid Ed25519 public key".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_bytes_roundtrip() {
        let pair = SigningKeyPair::generate();
        let rebuilt = SigningKeyPair::from_secret_bytes(&pair.secret_bytes());
        assert_eq!(
            pair.verifying_key().as_bytes(),
            rebuilt.verifying_key().as_bytes()
        );
    }

    #[test]
    fn debug_hides_secret() {
        let pair = SigningKeyPair::generate();
        assert!(format!("{pair:?}").contains("REDACTED"));
    }

    #[test]
    fn public_key_bytes_parse_back() {
        let pair = SigningKeyPair::generate();
        let bytes = pair.verifying_key().to_bytes();
        let parsed = verifying_key_from_bytes(&bytes).unwrap();
        assert_eq!(parsed, pair.verifying_key());
    }
}
